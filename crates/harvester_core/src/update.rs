use crate::{CollectionState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: CollectionState, msg: Msg) -> (CollectionState, Vec<Effect>) {
    let effects = match msg {
        Msg::ItemDone {
            index,
            outcome,
            progress_reported,
        } => {
            if !state.record(index, &outcome) {
                return (state, Vec::new());
            }
            let mut effects = Vec::with_capacity(2);
            let remainder = (1.0 - progress_reported).clamp(0.0, 1.0);
            if remainder > 0.0 {
                effects.push(Effect::AdvanceProgress {
                    fraction: remainder,
                });
            }
            if outcome.is_failure() {
                effects.push(Effect::ReportItemFailure { index, outcome });
            }
            effects
        }
        Msg::SourceFailed { reason } => {
            state.abort(reason);
            Vec::new()
        }
        Msg::CollectionFinished => {
            if !state.finish() {
                return (state, Vec::new());
            }
            let view = state.view();
            let mut effects = vec![Effect::ReportSummary(view.summary())];
            if !view.mergeable.is_empty() {
                effects.push(Effect::OfferMerge {
                    default_yes: view.merge_default(),
                    indices: view.mergeable,
                });
            }
            effects
        }
    };

    (state, effects)
}
