use std::future::Future;
use iced_futures::{Executor, MaybeSend};
use tokio::runtime::{Builder, Runtime};

/// Runs every `Command` and `Subscription` of the panel on a multi threaded tokio runtime, which
/// the bluetooth client and the playlist resolver need.
pub struct MyExecutor {
    runtime: Runtime,
}

impl Executor for MyExecutor {
    fn new() -> Result<Self, futures::io::Error> {
        let runtime = Builder::new_multi_thread()
            .thread_name("panel-worker")
            .enable_all()
            .build()?;

        Ok(MyExecutor { runtime })
    }

    fn spawn(&self, future: impl Future<Output = ()> + MaybeSend + 'static) {
        let _ = self.runtime.spawn(future);
    }

    fn enter<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.runtime.enter();
        f()
    }
}
