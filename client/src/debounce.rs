use std::{future::Future, time::Duration};

use tokio::{task::JoinHandle, time::sleep};

/// Trailing-edge debouncer: each call supersedes the previous pending one,
/// so only the last call inside a quiet window runs its action.
///
/// Cancellation only reaches actions that have not fired yet. Once the quiet
/// window elapses the action is detached and runs to completion even if new
/// calls come in behind it.
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn call<F>(&mut self, acao: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Some(pendente) = self.pending.take() {
            pendente.abort();
        }

        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            sleep(delay).await;

            tokio::spawn(acao);
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(pendente) = self.pending.take() {
            pendente.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use tokio::time::advance;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_rapid_calls_collapse_to_last() {
        let execucoes = Arc::new(AtomicUsize::new(0));
        let ultimo = Arc::new(Mutex::new(String::new()));

        let mut debouncer = Debouncer::new(Duration::from_millis(800));

        for i in 0..5 {
            let execucoes = execucoes.clone();
            let ultimo = ultimo.clone();
            let valor = format!("v{i}");

            debouncer.call(async move {
                execucoes.fetch_add(1, Ordering::SeqCst);
                *ultimo.lock().unwrap() = valor;
            });

            advance(Duration::from_millis(100)).await;
        }

        assert_eq!(execucoes.load(Ordering::SeqCst), 0);

        advance(Duration::from_millis(900)).await;
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }

        assert_eq!(execucoes.load(Ordering::SeqCst), 1);
        assert_eq!(*ultimo.lock().unwrap(), "v4");
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_calls_each_fire() {
        let execucoes = Arc::new(AtomicUsize::new(0));

        let mut debouncer = Debouncer::new(Duration::from_millis(800));

        for _ in 0..2 {
            let execucoes = execucoes.clone();

            debouncer.call(async move {
                execucoes.fetch_add(1, Ordering::SeqCst);
            });

            advance(Duration::from_millis(1000)).await;
            for _ in 0..4 {
                tokio::task::yield_now().await;
            }
        }

        assert_eq!(execucoes.load(Ordering::SeqCst), 2);
    }
}
