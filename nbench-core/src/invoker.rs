//! Benchmark Invokers
//!
//! The seam between the engine and user code. An invoker runs the setup,
//! body and cleanup of one benchmark against a trial's [`BenchmarkContext`].

use crate::context::BenchmarkContext;
use std::error::Error;

/// Outcome of one call into user code
pub type InvokeResult = Result<(), Box<dyn Error + Send + Sync>>;

/// User code under measurement.
///
/// `Send` because background-sampled trials run the body on a worker thread.
pub trait BenchmarkInvoker: Send {
    /// Prepare state before the timed body
    fn invoke_setup(&mut self, _context: &BenchmarkContext) -> InvokeResult {
        Ok(())
    }

    /// Run the body once
    fn invoke_run(&mut self, context: &BenchmarkContext) -> InvokeResult;

    /// Run the body `n` times, stopping at the first error
    fn invoke_run_n(&mut self, context: &BenchmarkContext, n: u64) -> InvokeResult {
        for _ in 0..n {
            self.invoke_run(context)?;
        }
        Ok(())
    }

    /// Release state after the timed body; runs even when setup failed
    fn invoke_cleanup(&mut self, _context: &BenchmarkContext) -> InvokeResult {
        Ok(())
    }
}

impl<T: BenchmarkInvoker + ?Sized> BenchmarkInvoker for Box<T> {
    fn invoke_setup(&mut self, context: &BenchmarkContext) -> InvokeResult {
        (**self).invoke_setup(context)
    }

    #[inline]
    fn invoke_run(&mut self, context: &BenchmarkContext) -> InvokeResult {
        (**self).invoke_run(context)
    }

    fn invoke_run_n(&mut self, context: &BenchmarkContext, n: u64) -> InvokeResult {
        (**self).invoke_run_n(context, n)
    }

    fn invoke_cleanup(&mut self, context: &BenchmarkContext) -> InvokeResult {
        (**self).invoke_cleanup(context)
    }
}

type Hook<'a> = Box<dyn FnMut(&BenchmarkContext) -> InvokeResult + Send + 'a>;

/// Closure-backed [`BenchmarkInvoker`]
pub struct BenchmarkMethods<'a> {
    setup: Option<Hook<'a>>,
    run: Hook<'a>,
    cleanup: Option<Hook<'a>>,
}

impl<'a> BenchmarkMethods<'a> {
    /// Body that cannot fail
    pub fn new(mut run: impl FnMut(&BenchmarkContext) + Send + 'a) -> Self {
        Self::fallible(move |ctx| {
            run(ctx);
            Ok(())
        })
    }

    /// Body that reports failure through its result
    pub fn fallible(run: impl FnMut(&BenchmarkContext) -> InvokeResult + Send + 'a) -> Self {
        Self {
            setup: None,
            run: Box::new(run),
            cleanup: None,
        }
    }

    /// Run `setup` before each trial
    pub fn with_setup(
        mut self,
        setup: impl FnMut(&BenchmarkContext) -> InvokeResult + Send + 'a,
    ) -> Self {
        self.setup = Some(Box::new(setup));
        self
    }

    /// Run `cleanup` after each trial
    pub fn with_cleanup(
        mut self,
        cleanup: impl FnMut(&BenchmarkContext) -> InvokeResult + Send + 'a,
    ) -> Self {
        self.cleanup = Some(Box::new(cleanup));
        self
    }
}

impl BenchmarkInvoker for BenchmarkMethods<'_> {
    fn invoke_setup(&mut self, context: &BenchmarkContext) -> InvokeResult {
        match &mut self.setup {
            Some(setup) => setup(context),
            None => Ok(()),
        }
    }

    #[inline]
    fn invoke_run(&mut self, context: &BenchmarkContext) -> InvokeResult {
        (self.run)(context)
    }

    fn invoke_cleanup(&mut self, context: &BenchmarkContext) -> InvokeResult {
        match &mut self.cleanup {
            Some(cleanup) => cleanup(context),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CancellationToken;
    use fxhash::FxHashMap;

    fn context() -> BenchmarkContext {
        BenchmarkContext::new("b", FxHashMap::default(), CancellationToken::new())
    }

    #[test]
    fn test_run_n_stops_at_first_error() {
        let mut calls = 0;
        let mut methods = BenchmarkMethods::fallible(|_| {
            calls += 1;
            if calls == 3 { Err("third call".into()) } else { Ok(()) }
        });

        let err = methods.invoke_run_n(&context(), 10).unwrap_err();
        assert_eq!(err.to_string(), "third call");
        drop(methods);
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_hooks_default_to_ok() {
        let mut methods = BenchmarkMethods::new(|_| {});
        assert!(methods.invoke_setup(&context()).is_ok());
        assert!(methods.invoke_cleanup(&context()).is_ok());
    }

    #[test]
    fn test_setup_and_cleanup_hooks() {
        let mut log = Vec::new();
        {
            let log = std::sync::Mutex::new(&mut log);
            let mut methods = BenchmarkMethods::new(|_| {})
                .with_setup(|_| {
                    log.lock().unwrap().push("setup");
                    Ok(())
                })
                .with_cleanup(|_| Err("cleanup failed".into()));

            methods.invoke_setup(&context()).unwrap();
            assert!(methods.invoke_cleanup(&context()).is_err());
        }
        assert_eq!(log, vec!["setup"]);
    }
}
