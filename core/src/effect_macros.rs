//! Declarative macros for ergonomic effect construction
//!
//! The seat picker mostly schedules two kinds of effects: an async fetch whose
//! result is fed back as an action, and a delayed follow-up action (the next
//! availability poll). These macros keep those call sites short.

/// Create an `Effect::Delay` that dispatches `action` after `duration`
///
/// # Example
///
/// ```rust
/// use seat_picker_core::delay;
/// use seat_picker_core::effect::Effect;
/// use std::time::Duration;
///
/// #[derive(Clone, Debug)]
/// enum Action {
///     Poll { generation: u64 },
/// }
///
/// let effect: Effect<Action> = delay! {
///     duration: Duration::from_secs(5),
///     action: Action::Poll { generation: 1 }
/// };
/// assert!(matches!(effect, Effect::Delay { .. }));
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Delay {
            duration: $duration,
            action: ::std::boxed::Box::new($action),
        }
    };
}

/// Create an `Effect::Future` from an async block producing `Option<Action>`
///
/// # Example
///
/// ```rust
/// use seat_picker_core::async_effect;
/// use seat_picker_core::effect::Effect;
///
/// #[derive(Clone, Debug)]
/// enum Action {
///     Fetched(Vec<u32>),
/// }
///
/// let effect: Effect<Action> = async_effect! {
///     Some(Action::Fetched(vec![3, 7]))
/// };
/// assert!(matches!(effect, Effect::Future(_)));
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(::std::boxed::Box::pin(async move { $($body)* }))
    };
}
