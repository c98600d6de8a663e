mod kv;
#[cfg(all(feature = "sqlite", not(target_arch = "wasm32")))]
mod sqlite;
mod timer;

pub use self::kv::{
    execute, KeyValue, KvError, KvOperation, KvOutput, KvResult, KvStorage, MemoryStorage,
    StorageErrorCode, MAX_KEY_LENGTH, MAX_VALUE_SIZE,
};
#[cfg(all(feature = "sqlite", not(target_arch = "wasm32")))]
pub use self::sqlite::SqliteStorage;
pub use self::timer::{TickScheduler, Timer, TimerOperation};

// Crux's built-in Render covers view updates; key-value and the focus tick
// are our own capabilities.
pub use crux_core::render::{Render, RenderOperation};
pub use crux_core::Request;

use crate::app::App;
use crate::event::Event;

/// Field types name the generated `Effect` variants: `Render`, `KeyValue`, `Timer`.
#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub render: Render<Event>,
    pub kv: KeyValue<Event>,
    pub timer: Timer<Event>,
}
