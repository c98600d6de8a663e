//! Effect inspection on top of [`crux_core::testing::Update`].

use crux_core::testing::Update;

use crate::capabilities::{Effect, KvOperation, TimerOperation};
use crate::event::Event;

pub trait UpdateExt {
    fn has_render(&self) -> bool;

    /// Key-value operations in the order they were requested.
    fn kv_operations(&self) -> Vec<&KvOperation>;

    fn timer_operations(&self) -> Vec<TimerOperation>;
}

impl UpdateExt for Update<Effect, Event> {
    fn has_render(&self) -> bool {
        self.effects.iter().any(|e| matches!(e, Effect::Render(_)))
    }

    fn kv_operations(&self) -> Vec<&KvOperation> {
        self.effects
            .iter()
            .filter_map(|e| match e {
                Effect::KeyValue(req) => Some(&req.operation),
                _ => None,
            })
            .collect()
    }

    fn timer_operations(&self) -> Vec<TimerOperation> {
        self.effects
            .iter()
            .filter_map(|e| match e {
                Effect::Timer(req) => Some(req.operation),
                _ => None,
            })
            .collect()
    }
}
