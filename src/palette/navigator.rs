//! Two-state model of the target application's colour picker.
//!
//! The picker shows a row of main colours. Clicking the palette icon opens
//! the submenu of the currently selected main colour, whose sub colours sit
//! at fixed slot positions shared by every main colour. The back button
//! closes the submenu.
//!
//! The navigator never touches a device. It answers "what must be clicked to
//! select this entry" and updates its model as if those clicks happened.
use serde::{Deserialize, Serialize};

use crate::errors::{PainterError, PainterResult};
use crate::palette::types::{EntryKind, PaletteEntry, ScreenPoint};

/// Fixed picker coordinates from calibration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerLayout {
    pub palette_icon: ScreenPoint,
    pub back: ScreenPoint,
    pub sub_slots: Vec<ScreenPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuState {
    Root,
    Submenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavTarget {
    Main,
    PaletteIcon,
    SubSlot(usize),
    Back,
}

/// One logical click the executor must perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavAction {
    pub target: NavTarget,
    pub point: ScreenPoint,
}

#[derive(Debug, Clone)]
pub struct Navigator {
    layout: PickerLayout,
    state: MenuState,
    /// Location of the main colour the UI considers selected.
    active_main: Option<ScreenPoint>,
    /// True while the last root-level click was on `active_main`, meaning the
    /// palette icon will open its submenu without re-selecting it.
    main_armed: bool,
}

impl Navigator {
    pub fn new(layout: PickerLayout) -> Self {
        Self {
            layout,
            state: MenuState::Root,
            active_main: None,
            main_armed: false,
        }
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    pub fn active_main(&self) -> Option<ScreenPoint> {
        self.active_main
    }

    /// Fails if any entry addresses a submenu slot the layout does not have.
    pub fn check_reachable<'a, I>(&self, entries: I) -> PainterResult<()>
    where
        I: IntoIterator<Item = &'a PaletteEntry>,
    {
        for entry in entries {
            if let EntryKind::Sub { slot } = entry.kind {
                if slot >= self.layout.sub_slots.len() {
                    return Err(PainterError::Calibration(format!(
                        "{} uses submenu slot {} but only {} slots are calibrated",
                        entry.rgb,
                        slot,
                        self.layout.sub_slots.len()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Returns the clicks needed to make `entry` the active drawing colour.
    pub fn select(&mut self, entry: &PaletteEntry) -> PainterResult<Vec<NavAction>> {
        match entry.kind {
            EntryKind::Main => {
                let mut actions = Vec::with_capacity(2);
                if let Some(back) = self.close_submenu() {
                    actions.push(back);
                }
                actions.push(self.click_main(entry.loc));
                Ok(actions)
            }
            EntryKind::Sub { slot } => {
                let point = self.slot_point(slot)?;
                let mut actions = self.open_submenu_of(entry.loc);
                actions.push(NavAction {
                    target: NavTarget::SubSlot(slot),
                    point,
                });
                Ok(actions)
            }
        }
    }

    /// Brings the UI into the submenu of the main colour at `owner`.
    /// Emits nothing when that submenu is already open.
    pub fn open_submenu_of(&mut self, owner: ScreenPoint) -> Vec<NavAction> {
        let mut actions = Vec::new();
        if self.state == MenuState::Submenu {
            if self.active_main == Some(owner) {
                return actions;
            }
            actions.extend(self.close_submenu());
        }

        if !(self.main_armed && self.active_main == Some(owner)) {
            actions.push(self.click_main(owner));
        }

        actions.push(NavAction {
            target: NavTarget::PaletteIcon,
            point: self.layout.palette_icon,
        });
        self.state = MenuState::Submenu;
        self.main_armed = false;
        tracing::trace!(owner_x = owner.x, owner_y = owner.y, "submenu opened");
        actions
    }

    /// Leaves the UI at the root row. Call once at the end of a run.
    pub fn finish(&mut self) -> Option<NavAction> {
        self.close_submenu()
    }

    pub fn slot_point(&self, slot: usize) -> PainterResult<ScreenPoint> {
        self.layout.sub_slots.get(slot).copied().ok_or_else(|| {
            PainterError::Calibration(format!(
                "submenu slot {slot} is not calibrated ({} slots)",
                self.layout.sub_slots.len()
            ))
        })
    }

    fn click_main(&mut self, loc: ScreenPoint) -> NavAction {
        self.active_main = Some(loc);
        self.main_armed = true;
        NavAction {
            target: NavTarget::Main,
            point: loc,
        }
    }

    fn close_submenu(&mut self) -> Option<NavAction> {
        if self.state != MenuState::Submenu {
            return None;
        }
        self.state = MenuState::Root;
        // back restores the root row but the main is no longer the fresh pick
        self.main_armed = false;
        Some(NavAction {
            target: NavTarget::Back,
            point: self.layout.back,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::types::Rgb;

    const A: ScreenPoint = ScreenPoint::new(100, 50);
    const B: ScreenPoint = ScreenPoint::new(140, 50);
    const ICON: ScreenPoint = ScreenPoint::new(500, 40);
    const BACK: ScreenPoint = ScreenPoint::new(20, 40);

    fn layout() -> PickerLayout {
        PickerLayout {
            palette_icon: ICON,
            back: BACK,
            sub_slots: (0..9).map(|i| ScreenPoint::new(300 + i * 10, 200)).collect(),
        }
    }

    fn targets(actions: &[NavAction]) -> Vec<NavTarget> {
        actions.iter().map(|a| a.target).collect()
    }

    #[test]
    fn contiguous_submenu_run_opens_and_closes_once() {
        let mut nav = Navigator::new(layout());
        let main_a = PaletteEntry::main(Rgb(1, 0, 0), A);
        let sub_a0 = PaletteEntry::sub(Rgb(2, 0, 0), A, 0);
        let sub_a1 = PaletteEntry::sub(Rgb(3, 0, 0), A, 1);
        let main_b = PaletteEntry::main(Rgb(4, 0, 0), B);

        let mut all = Vec::new();
        for entry in [&main_a, &sub_a0, &sub_a1, &main_b] {
            all.extend(nav.select(entry).unwrap());
        }

        let points: Vec<ScreenPoint> = all.iter().map(|a| a.point).collect();
        assert_eq!(
            points,
            vec![A, ICON, ScreenPoint::new(300, 200), ScreenPoint::new(310, 200), BACK, B]
        );
        assert_eq!(
            targets(&all),
            vec![
                NavTarget::Main,
                NavTarget::PaletteIcon,
                NavTarget::SubSlot(0),
                NavTarget::SubSlot(1),
                NavTarget::Back,
                NavTarget::Main,
            ]
        );
        assert_eq!(nav.state(), MenuState::Root);
        assert_eq!(nav.finish(), None);
    }

    #[test]
    fn sub_without_prior_main_selects_owner_first() {
        let mut nav = Navigator::new(layout());
        let actions = nav.select(&PaletteEntry::sub(Rgb(2, 0, 0), A, 3)).unwrap();
        assert_eq!(
            targets(&actions),
            vec![NavTarget::Main, NavTarget::PaletteIcon, NavTarget::SubSlot(3)]
        );
        assert_eq!(nav.active_main(), Some(A));
        assert_eq!(nav.state(), MenuState::Submenu);
    }

    #[test]
    fn switching_owner_goes_back_then_reselects() {
        let mut nav = Navigator::new(layout());
        nav.select(&PaletteEntry::sub(Rgb(2, 0, 0), A, 0)).unwrap();
        let actions = nav.select(&PaletteEntry::sub(Rgb(5, 0, 0), B, 2)).unwrap();
        assert_eq!(
            targets(&actions),
            vec![
                NavTarget::Back,
                NavTarget::Main,
                NavTarget::PaletteIcon,
                NavTarget::SubSlot(2)
            ]
        );
        assert_eq!(actions[1].point, B);
    }

    #[test]
    fn reentering_same_submenu_reaffirms_main() {
        let mut nav = Navigator::new(layout());
        nav.select(&PaletteEntry::sub(Rgb(2, 0, 0), A, 0)).unwrap();
        // a main colour elsewhere, then back into A's submenu
        nav.select(&PaletteEntry::main(Rgb(4, 0, 0), B)).unwrap();
        let actions = nav.select(&PaletteEntry::sub(Rgb(3, 0, 0), A, 1)).unwrap();
        assert_eq!(actions[0], NavAction { target: NavTarget::Main, point: A });
        assert_eq!(actions[1].target, NavTarget::PaletteIcon);
    }

    #[test]
    fn never_opens_palette_twice_without_back() {
        let mut nav = Navigator::new(layout());
        let plan = [
            PaletteEntry::sub(Rgb(1, 0, 0), A, 0),
            PaletteEntry::sub(Rgb(2, 0, 0), A, 4),
            PaletteEntry::sub(Rgb(3, 0, 0), B, 1),
            PaletteEntry::main(Rgb(4, 0, 0), A),
            PaletteEntry::sub(Rgb(5, 0, 0), A, 8),
        ];
        let mut all = Vec::new();
        for entry in &plan {
            all.extend(nav.select(entry).unwrap());
        }
        all.extend(nav.finish());

        let mut open = false;
        for action in &all {
            match action.target {
                NavTarget::PaletteIcon => {
                    assert!(!open, "palette icon clicked twice without back");
                    open = true;
                }
                NavTarget::Back => {
                    assert!(open, "back clicked outside a submenu");
                    open = false;
                }
                _ => {}
            }
        }
        assert!(!open);
        assert_eq!(nav.state(), MenuState::Root);
    }

    #[test]
    fn finish_closes_open_submenu() {
        let mut nav = Navigator::new(layout());
        nav.select(&PaletteEntry::sub(Rgb(2, 0, 0), A, 0)).unwrap();
        assert_eq!(
            nav.finish(),
            Some(NavAction { target: NavTarget::Back, point: BACK })
        );
        assert_eq!(nav.finish(), None);
    }

    #[test]
    fn out_of_range_slot_is_a_precondition_failure() {
        let nav = Navigator::new(layout());
        let bad = PaletteEntry::sub(Rgb(2, 0, 0), A, 9);
        assert!(matches!(
            nav.check_reachable([&bad]),
            Err(PainterError::Calibration(_))
        ));
        let good = PaletteEntry::sub(Rgb(2, 0, 0), A, 8);
        assert!(nav.check_reachable([&good]).is_ok());
    }
}
