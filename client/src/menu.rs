//! Menu open/close animation and the clock it runs on.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Source of "now" for animations. Only differences between readings matter.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Wall clock measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, to: Duration) {
        self.now.set(to);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Lets a test keep a handle on a clock it gave away.
impl<T: Clock + ?Sized> Clock for Rc<T> {
    fn now(&self) -> Duration {
        (**self).now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Tween {
    start_value: f32,
    end_value: f32,
    start: Duration,
}

/// Vertical scale of the keyboard and menu panels, eased between 0 and 1.
#[derive(Debug, Clone)]
pub struct MenuAnimation {
    scale: f32,
    visible: bool,
    tween: Option<Tween>,
    duration: Duration,
    exponent: f32,
}

impl MenuAnimation {
    pub fn new(duration: Duration, exponent: f32) -> Self {
        Self {
            scale: 0.0,
            visible: false,
            tween: None,
            duration,
            exponent,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Whether the menu layers should be drawn and hit-tested.
    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn is_animating(&self) -> bool {
        self.tween.is_some()
    }

    /// Start opening if mostly closed, closing otherwise. Returns true when
    /// opening.
    pub fn toggle(&mut self, now: Duration) -> bool {
        let opening = self.scale < 0.5;
        self.tween = Some(Tween {
            start_value: self.scale,
            end_value: if opening { 1.0 } else { 0.0 },
            start: now,
        });
        opening
    }

    /// Advance to `now`. The ease is front-loaded: `(elapsed / duration)^exponent`.
    pub fn update(&mut self, now: Duration) {
        let Some(tween) = self.tween else {
            return;
        };
        let elapsed = now.saturating_sub(tween.start).as_secs_f32();
        let factor = (elapsed / self.duration.as_secs_f32()).powf(self.exponent);
        if factor < 1.0 {
            self.scale = tween.start_value * (1.0 - factor) + tween.end_value * factor;
            self.visible = true;
        } else {
            self.scale = tween.end_value;
            self.visible = self.scale > 0.5;
            self.tween = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    fn menu() -> MenuAnimation {
        MenuAnimation::new(Duration::from_millis(300), 0.15)
    }

    #[test]
    fn starts_closed() {
        let m = menu();
        assert_eq!(m.scale(), 0.0);
        assert!(!m.visible());
        assert!(!m.is_animating());
    }

    #[test]
    fn opening_eases_front_loaded() {
        let clock = ManualClock::default();
        let mut m = menu();
        assert!(m.toggle(clock.now()));

        clock.advance(30 * MS);
        m.update(clock.now());
        // (0.1)^0.15 ~= 0.708, well past the linear 0.1
        assert!((m.scale() - 0.1f32.powf(0.15)).abs() < 1e-4);
        assert!(m.visible());
        assert!(m.is_animating());
    }

    #[test]
    fn opening_settles_visible_at_full_scale() {
        let clock = ManualClock::default();
        let mut m = menu();
        m.toggle(clock.now());
        clock.advance(300 * MS);
        m.update(clock.now());
        assert_eq!(m.scale(), 1.0);
        assert!(m.visible());
        assert!(!m.is_animating());
    }

    #[test]
    fn closing_settles_hidden() {
        let clock = ManualClock::default();
        let mut m = menu();
        m.toggle(clock.now());
        clock.advance(400 * MS);
        m.update(clock.now());

        assert!(!m.toggle(clock.now()));
        clock.advance(150 * MS);
        m.update(clock.now());
        assert!(m.visible());
        assert!(m.scale() < 0.5);

        clock.advance(150 * MS);
        m.update(clock.now());
        assert_eq!(m.scale(), 0.0);
        assert!(!m.visible());
    }

    #[test]
    fn update_without_animation_is_a_noop() {
        let mut m = menu();
        m.update(Duration::from_secs(10));
        assert_eq!(m.scale(), 0.0);
        assert!(!m.visible());
    }

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock::default();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
