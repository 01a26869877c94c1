// src/gesture.rs
//
// Pointer gestures -> note intents.

use crate::event::Intent;

/// Bit of `PointerEvent::Down::buttons` for the primary (left) button.
pub const PRIMARY_BUTTON: u16 = 1;

/// Raw pointer signals as the page reports them.
///
/// `key` is the id of the key element under the pointer, or `None` when the
/// event happened elsewhere on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent<'a> {
    Down { key: Option<&'a str>, buttons: u16 },

    Up { key: Option<&'a str> },

    Over { key: &'a str },

    Leave { key: &'a str },
}

/// Owns the "pointer engaged" flag and turns pointer events into intents.
///
/// Holding the primary button and sliding across keys retriggers each key
/// it enters, and releases each key it leaves. There is no debouncing.
#[derive(Debug, Default)]
pub struct GestureRouter {
    engaged: bool,
}

impl GestureRouter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    pub fn route<'a>(&mut self, event: PointerEvent<'a>) -> Option<Intent<'a>> {
        match event {
            PointerEvent::Down { key, buttons } => {
                if buttons & PRIMARY_BUTTON == 0 {
                    return None;
                }
                self.engaged = true;
                key.map(Intent::Start)
            }

            // Releasing anywhere disengages, even off the keyboard
            PointerEvent::Up { key } => {
                self.engaged = false;
                key.map(Intent::Stop)
            }

            PointerEvent::Over { key } => self.engaged.then_some(Intent::Start(key)),

            PointerEvent::Leave { key } => Some(Intent::Stop(key)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_down_on_key_starts_and_engages() {
        let mut router = GestureRouter::new();
        let intent = router.route(PointerEvent::Down {
            key: Some("C4"),
            buttons: PRIMARY_BUTTON,
        });
        assert_eq!(intent, Some(Intent::Start("C4")));
        assert!(router.is_engaged());
    }

    #[test]
    fn test_secondary_button_is_ignored() {
        let mut router = GestureRouter::new();
        let intent = router.route(PointerEvent::Down {
            key: Some("C4"),
            buttons: 2,
        });
        assert_eq!(intent, None);
        assert!(!router.is_engaged());
    }

    #[test]
    fn test_down_off_keyboard_engages_without_intent() {
        let mut router = GestureRouter::new();
        let intent = router.route(PointerEvent::Down {
            key: None,
            buttons: PRIMARY_BUTTON,
        });
        assert_eq!(intent, None);
        assert!(router.is_engaged());
        assert_eq!(
            router.route(PointerEvent::Over { key: "E4" }),
            Some(Intent::Start("E4"))
        );
    }

    #[test]
    fn test_over_only_while_engaged() {
        let mut router = GestureRouter::new();
        assert_eq!(router.route(PointerEvent::Over { key: "E4" }), None);

        router.route(PointerEvent::Down {
            key: None,
            buttons: PRIMARY_BUTTON,
        });
        assert_eq!(
            router.route(PointerEvent::Over { key: "E4" }),
            Some(Intent::Start("E4"))
        );

        router.route(PointerEvent::Up { key: None });
        assert_eq!(router.route(PointerEvent::Over { key: "E4" }), None);
    }

    #[test]
    fn test_up_on_key_stops_and_disengages() {
        let mut router = GestureRouter::new();
        router.route(PointerEvent::Down {
            key: Some("A4"),
            buttons: PRIMARY_BUTTON,
        });
        assert_eq!(
            router.route(PointerEvent::Up { key: Some("A4") }),
            Some(Intent::Stop("A4"))
        );
        assert!(!router.is_engaged());
    }

    #[test]
    fn test_leave_always_stops() {
        let mut router = GestureRouter::new();
        assert_eq!(
            router.route(PointerEvent::Leave { key: "D4" }),
            Some(Intent::Stop("D4"))
        );
    }

    #[test]
    fn test_slide_across_keys() {
        let mut router = GestureRouter::new();
        let events = [
            PointerEvent::Down {
                key: Some("C4"),
                buttons: PRIMARY_BUTTON,
            },
            PointerEvent::Leave { key: "C4" },
            PointerEvent::Over { key: "D4" },
            PointerEvent::Leave { key: "D4" },
            PointerEvent::Over { key: "E4" },
            PointerEvent::Up { key: Some("E4") },
        ];
        let intents: Vec<_> = events.into_iter().filter_map(|e| router.route(e)).collect();
        assert_eq!(
            intents,
            vec![
                Intent::Start("C4"),
                Intent::Stop("C4"),
                Intent::Start("D4"),
                Intent::Stop("D4"),
                Intent::Start("E4"),
                Intent::Stop("E4"),
            ]
        );
    }
}
