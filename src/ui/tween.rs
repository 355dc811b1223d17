//! Timed UI animations
//!
//! Tweens are queued by the frontend when game events arrive and advanced
//! once per frame. The renderer samples the current value per element.
//! A tween whose element has since disappeared simply runs out unseen.

/// Something on screen that can be animated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiElement {
    Modal,
    Quiz,
    Toast,
    Hud,
    Boss,
}

/// Shape of an animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TweenKind {
    /// 0 → 1
    FadeIn,
    /// 1 → 0
    FadeOut,
    /// Scale up with a slight overshoot
    Pop,
    /// Full intensity decaying to nothing
    Flash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    #[default]
    Linear,
    QuadOut,
    BackOut,
}

impl Easing {
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::BackOut => {
                const C1: f32 = 1.70158;
                const C3: f32 = C1 + 1.0;
                let u = t - 1.0;
                1.0 + C3 * u * u * u + C1 * u * u
            }
        }
    }
}

/// One queued animation
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    pub target: UiElement,
    pub kind: TweenKind,
    pub duration: f32,
    elapsed: f32,
}

impl Tween {
    pub fn new(target: UiElement, kind: TweenKind, duration: f32) -> Self {
        Self { target, kind, duration: duration.max(0.0), elapsed: 0.0 }
    }

    pub fn fade_in(target: UiElement, duration: f32) -> Self {
        Self::new(target, TweenKind::FadeIn, duration)
    }

    pub fn fade_out(target: UiElement, duration: f32) -> Self {
        Self::new(target, TweenKind::FadeOut, duration)
    }

    pub fn pop(target: UiElement, duration: f32) -> Self {
        Self::new(target, TweenKind::Pop, duration)
    }

    pub fn flash(target: UiElement, duration: f32) -> Self {
        Self::new(target, TweenKind::Flash, duration)
    }

    /// Normalised progress 0..=1
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        }
    }

    pub fn is_done(&self) -> bool {
        self.progress() >= 1.0
    }

    /// Current animated value
    pub fn value(&self) -> f32 {
        let t = self.progress();
        match self.kind {
            TweenKind::FadeIn => Easing::QuadOut.apply(t),
            TweenKind::FadeOut => 1.0 - Easing::Linear.apply(t),
            TweenKind::Pop => Easing::BackOut.apply(t),
            TweenKind::Flash => 1.0 - Easing::QuadOut.apply(t),
        }
    }
}

/// Every running animation
#[derive(Debug, Clone, Default)]
pub struct TweenQueue {
    tasks: Vec<Tween>,
}

impl TweenQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a tween, replacing any running tween on the same element
    pub fn push(&mut self, tween: Tween) {
        self.tasks.retain(|t| t.target != tween.target);
        self.tasks.push(tween);
    }

    /// Advance every tween and drop the finished ones
    pub fn tick(&mut self, dt: f32) {
        for task in &mut self.tasks {
            task.elapsed += dt;
        }
        self.tasks.retain(|t| !t.is_done());
    }

    /// Value of the running tween on `target`, if any
    pub fn value(&self, target: UiElement) -> Option<f32> {
        self.tasks.iter().find(|t| t.target == target).map(Tween::value)
    }

    pub fn cancel(&mut self, target: UiElement) {
        self.tasks.retain(|t| t.target != target);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finished_tweens_are_removed() {
        let mut queue = TweenQueue::new();
        queue.push(Tween::fade_in(UiElement::Modal, 0.2));
        queue.push(Tween::flash(UiElement::Hud, 1.0));
        queue.tick(0.25);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.value(UiElement::Modal), None);
        assert!(queue.value(UiElement::Hud).is_some());
    }

    #[test]
    fn test_same_target_replaces() {
        let mut queue = TweenQueue::new();
        queue.push(Tween::fade_in(UiElement::Toast, 1.0));
        queue.push(Tween::fade_out(UiElement::Toast, 1.0));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.value(UiElement::Toast), Some(1.0));
    }

    #[test]
    fn test_curve_endpoints() {
        for easing in [Easing::Linear, Easing::QuadOut, Easing::BackOut] {
            assert!(easing.apply(0.0).abs() < 1e-5);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-5);
        }
        let mut pop = Tween::pop(UiElement::Modal, 1.0);
        pop.elapsed = 0.6;
        assert!(pop.value() > 1.0);
    }

    #[test]
    fn test_zero_duration_finishes_immediately() {
        let mut queue = TweenQueue::new();
        queue.push(Tween::flash(UiElement::Boss, 0.0));
        queue.tick(0.0);
        assert!(queue.is_empty());
    }
}
