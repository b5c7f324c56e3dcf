//! Selection predicates projected on the stores just before writing,
//! never inside the save paths.
use crate::Rinex;

use log::{info, warn};

impl Rinex {
    /// States the systems, satellites and observables that pass the
    /// writers. Empty lists accept everything.
    ///
    /// A satellite token is a system letter optionally followed by a
    /// PRN (`G`, `R07`); an observable token is a system letter
    /// followed by a V3.02 code (`GC1C`). Tokens are validated against
    /// the declared systems and observables: unknown ones are logged
    /// and ignored, the already-validated state stays, and `false` is
    /// returned.
    pub fn set_filter(&mut self, sel_sys_sat: &[&str], sel_obs: &[&str]) -> bool {
        // back to "no filter" before applying the new selection
        self.header.nav_filtering = false;
        self.header.obs_filtering = false;
        self.header.nav_selection.clear();
        for sys in self.header.systems.iter_mut() {
            sys.selected = true;
            sys.selected_sats.clear();
            for flag in sys.selected_observables.iter_mut() {
                *flag = true;
            }
        }
        if sel_sys_sat.is_empty() && sel_obs.is_empty() {
            info!("filtering data cleared");
            return true;
        }
        // normalized satellite tokens drive the navigation filter
        for token in sel_sys_sat {
            let token = token.trim();
            let mut chars = token.chars();
            let system = match chars.next() {
                Some(system) => system,
                None => continue,
            };
            match token[1..].trim().parse::<u8>() {
                Ok(prn) => self
                    .header
                    .nav_selection
                    .push(format!("{}{:02}", system, prn)),
                Err(_) if token.len() == 1 => {
                    self.header.nav_selection.push(system.to_string())
                },
                Err(_) => warn!("wrong sys-sat format ({}), ignored for filtering", token),
            }
        }
        self.header.nav_filtering = !self.header.nav_selection.is_empty();

        // project the selection onto the declared systems
        let mut coherent = true;
        let mut selected_systems = Vec::<usize>::new();
        let mut selected_obs = Vec::<(usize, usize)>::new();
        for token in self.header.nav_selection.clone() {
            let system = token.chars().next().unwrap_or(' ');
            match self.header.system_index(system) {
                Some(index) => {
                    selected_systems.push(index);
                    if token.len() > 1 {
                        if let Ok(prn) = token[1..].parse::<u8>() {
                            self.header.systems[index].selected_sats.push(prn);
                        }
                    }
                },
                None => {
                    warn!("selected system in {} not in the header records", token);
                    coherent = false;
                },
            }
        }
        for token in sel_obs {
            let token = token.trim();
            let system = token.chars().next().unwrap_or(' ');
            match self.header.system_index(system) {
                Some(index) => {
                    let code = &token[1..];
                    match self.header.systems[index]
                        .observables
                        .iter()
                        .position(|obs| obs.code() == code)
                    {
                        // an observable selection constrains its own
                        // system, it does not exclude the others
                        Some(obs_index) => selected_obs.push((index, obs_index)),
                        None => {
                            warn!("selected observable {} not in the header records", token);
                            coherent = false;
                        },
                    }
                },
                None => {
                    warn!("selected system in {} not in the header records", token);
                    coherent = false;
                },
            }
        }
        if !selected_systems.is_empty() {
            for sys in self.header.systems.iter_mut() {
                sys.selected = false;
            }
            for index in &selected_systems {
                self.header.systems[*index].selected = true;
            }
        }
        if !selected_obs.is_empty() {
            for (system_index, _) in &selected_obs {
                for flag in self.header.systems[*system_index]
                    .selected_observables
                    .iter_mut()
                {
                    *flag = false;
                }
            }
            for (system_index, obs_index) in &selected_obs {
                self.header.systems[*system_index].selected_observables[*obs_index] = true;
            }
        }
        for sys in &self.header.systems {
            if sys.selected {
                self.header.obs_filtering = true;
                info!(
                    "selected sys={} sats={:?} obs={}",
                    sys.constellation,
                    sys.selected_sats,
                    sys.observables
                        .iter()
                        .enumerate()
                        .filter(|(nth, _)| sys.selected_observables[*nth])
                        .map(|(_, obs)| obs.code())
                        .collect::<Vec<_>>()
                        .join(" "),
                );
            } else {
                info!("excluded sys={}", sys.constellation);
            }
        }
        coherent
    }

    /// Removes unselected measurements from the epoch store and sorts
    /// it. Returns whether anything remains.
    pub fn filter_observations(&mut self) -> bool {
        if self.header.obs_filtering {
            let header = &self.header;
            self.observations.retain(|obs| {
                let sys = &header.systems[obs.system_index];
                sys.selected
                    && sys.selected_observables[obs.obs_index]
                    && sys.is_sat_selected(obs.prn)
            });
        }
        self.observations.sort();
        !self.observations.is_empty()
    }

    /// Removes unselected ephemeris from the navigation store and
    /// sorts it. A bare system letter selects the whole system.
    /// Returns whether anything remains.
    pub fn filter_navigation(&mut self) -> bool {
        if self.header.nav_filtering {
            let selection = &self.header.nav_selection;
            self.navigation.retain(|nav| {
                let token = format!("{}{:02}", nav.system, nav.prn);
                selection.iter().any(|prefix| token.starts_with(prefix.as_str()))
            });
        }
        self.navigation.sort();
        !self.navigation.is_empty()
    }
}

#[cfg(test)]
mod test {
    use crate::constellation::Constellation;
    use crate::epoch::EpochFlag;
    use crate::observable::Observable;
    use crate::version::V302;
    use crate::Rinex;
    use std::str::FromStr;

    fn model() -> Rinex {
        let mut rinex = Rinex::new(Some(V302));
        for system in [Constellation::GPS, Constellation::Glonass] {
            rinex.header.set_system(
                system,
                ["C1C", "L1C"]
                    .iter()
                    .map(|c| Observable::from_str(c).unwrap())
                    .collect(),
            );
        }
        rinex
    }

    fn fill(rinex: &mut Rinex) {
        let tag = rinex.set_epoch_time(1880, 259_200.0, 0.0, EpochFlag::Ok);
        for (system, prn) in [('G', 3), ('G', 7), ('R', 5)] {
            rinex.save_obs(system, prn, "C1C", 2.0e7, 0, 7, tag);
            rinex.save_obs(system, prn, "L1C", 1.0e8, 0, 7, tag);
        }
    }

    #[test]
    fn observable_selection() {
        let mut rinex = model();
        fill(&mut rinex);
        assert!(rinex.set_filter(&[], &["GC1C"]));
        assert!(rinex.filter_observations());
        // every Glonass record passes, GPS keeps pseudoranges only
        let kept: Vec<(usize, usize)> = rinex
            .observations
            .iter()
            .map(|o| (o.system_index, o.obs_index))
            .collect();
        assert_eq!(kept, vec![(0, 0), (0, 0), (1, 0), (1, 1)]);
    }

    #[test]
    fn satellite_selection() {
        let mut rinex = model();
        fill(&mut rinex);
        assert!(rinex.set_filter(&["G7"], &[]));
        assert!(rinex.filter_observations());
        // only G07 survives: the system selection excluded Glonass
        assert!(rinex
            .observations
            .iter()
            .all(|o| o.system_index == 0 && o.prn == 7));
        assert_eq!(rinex.observations.len(), 2);
    }

    #[test]
    fn filter_is_idempotent() {
        let mut rinex = model();
        fill(&mut rinex);
        rinex.set_filter(&["G"], &[]);
        assert!(rinex.filter_observations());
        let first: Vec<u8> = rinex.observations.iter().map(|o| o.prn).collect();
        assert!(rinex.filter_observations());
        let second: Vec<u8> = rinex.observations.iter().map(|o| o.prn).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_tokens_keep_valid_state() {
        let mut rinex = model();
        fill(&mut rinex);
        // E is not declared: call fails but G selection holds
        assert!(!rinex.set_filter(&["G", "E"], &[]));
        assert!(rinex.filter_observations());
        assert!(rinex.observations.iter().all(|o| o.system_index == 0));
    }

    #[test]
    fn navigation_prefix_selection() {
        let mut rinex = model();
        let orbit = [[0.0; 4]; 8];
        rinex.save_nav('G', 7, orbit, 1000.0);
        rinex.save_nav('G', 8, orbit, 1000.0);
        rinex.save_nav('R', 5, orbit, 1000.0);
        rinex.set_filter(&["G07"], &[]);
        assert!(rinex.filter_navigation());
        assert_eq!(rinex.navigation.len(), 1);
        assert_eq!(rinex.navigation.iter().next().unwrap().prn, 7);

        // a bare letter matches the whole system
        let mut rinex = model();
        rinex.save_nav('G', 7, orbit, 1000.0);
        rinex.save_nav('G', 8, orbit, 1000.0);
        rinex.save_nav('R', 5, orbit, 1000.0);
        rinex.set_filter(&["G"], &[]);
        assert!(rinex.filter_navigation());
        assert_eq!(rinex.navigation.len(), 2);
    }

    #[test]
    fn clearing_the_filter() {
        let mut rinex = model();
        fill(&mut rinex);
        rinex.set_filter(&["G7"], &[]);
        assert!(rinex.set_filter(&[], &[]));
        assert!(rinex.filter_observations());
        assert_eq!(rinex.observations.len(), 6);
    }
}
