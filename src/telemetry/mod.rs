pub mod config;
pub mod ctx;
pub mod emit;
pub mod ops;

use std::marker::PhantomData;

use ctx::LogCtx;

pub fn init() -> LogCtx<ops::init::Init> { LogCtx { json: config::logs_are_json(), _marker: PhantomData } }
pub fn group() -> LogCtx<ops::group::Group> { LogCtx { json: config::logs_are_json(), _marker: PhantomData } }
pub fn recipe() -> LogCtx<ops::recipe::Recipe> { LogCtx { json: config::logs_are_json(), _marker: PhantomData } }
pub fn schedule() -> LogCtx<ops::schedule::Schedule> { LogCtx { json: config::logs_are_json(), _marker: PhantomData } }
pub fn shopping() -> LogCtx<ops::shopping::Shopping> { LogCtx { json: config::logs_are_json(), _marker: PhantomData } }
