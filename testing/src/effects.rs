//! Store-free effect execution
//!
//! Reducer tests usually stop at "which effects came back". When the effects
//! call mocks, it is more useful to run them and look at the actions they
//! produce. [`collect_actions`] does exactly that; [`drive`] goes one step
//! further and feeds every produced action back into the reducer until the
//! system settles, the way the Store does, but deterministically.

use kinxplore_core::{effect::Effect, reducer::Reducer};
use std::collections::VecDeque;

/// Upper bound on reduced actions in a single [`drive`] call.
const MAX_DRIVEN_ACTIONS: usize = 1_000;

/// Run effects and return the actions they produce
///
/// Effects run one after another so the output order is stable.
pub async fn collect_actions<A, I>(effects: I) -> Vec<A>
where
    I: IntoIterator<Item = Effect<A>>,
{
    let mut produced = Vec::new();
    for effect in effects {
        match effect {
            Effect::None => {},
            Effect::Future(fut) => produced.extend(fut.await),
        }
    }
    produced
}

/// Reduce an action, run its effects and reduce what they produce, until
/// nothing is left
///
/// Returns every action produced by effects, in the order they were reduced.
///
/// # Panics
///
/// Panics if more than a thousand actions are reduced, which indicates an
/// effect loop (for example a feed that always resubscribes).
#[allow(clippy::panic)] // Test helper
pub async fn drive<R>(
    reducer: &R,
    state: &mut R::State,
    action: R::Action,
    env: &R::Environment,
) -> Vec<R::Action>
where
    R: Reducer,
    R::Action: Clone + Send + 'static,
{
    let mut queue = VecDeque::from([action]);
    let mut produced = Vec::new();
    let mut reduced = 0_usize;

    while let Some(action) = queue.pop_front() {
        reduced += 1;
        if reduced > MAX_DRIVEN_ACTIONS {
            panic!("drive reduced more than {MAX_DRIVEN_ACTIONS} actions; effects never settle");
        }

        let effects = reducer.reduce(state, action, env);
        for next in collect_actions(effects).await {
            produced.push(next.clone());
            queue.push_back(next);
        }
    }

    produced
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::{SmallVec, smallvec};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Step {
        Start,
        Fetched(u8),
        Done,
    }

    struct Steps;

    impl Reducer for Steps {
        type State = Vec<u8>;
        type Action = Step;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Vec<u8>,
            action: Step,
            _env: &(),
        ) -> SmallVec<[Effect<Step>; 4]> {
            match action {
                Step::Start => smallvec![
                    Effect::future(async { Some(Step::Fetched(1)) }),
                    Effect::future(async { Some(Step::Fetched(2)) }),
                ],
                Step::Fetched(n) => {
                    state.push(n);
                    if state.len() == 2 {
                        smallvec![Effect::future(async { Some(Step::Done) })]
                    } else {
                        SmallVec::new()
                    }
                },
                Step::Done => SmallVec::new(),
            }
        }
    }

    #[tokio::test]
    async fn test_collect_actions_keeps_declaration_order() {
        let actions = collect_actions(vec![
            Effect::future(async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Some(1_u8)
            }),
            Effect::None,
            Effect::future(async { None }),
            Effect::future(async { Some(2) }),
        ])
        .await;

        assert_eq!(actions, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_drive_settles() {
        let mut state = Vec::new();
        let produced = drive(&Steps, &mut state, Step::Start, &()).await;

        assert_eq!(state, vec![1, 2]);
        assert_eq!(produced, vec![Step::Fetched(1), Step::Fetched(2), Step::Done]);
    }
}
