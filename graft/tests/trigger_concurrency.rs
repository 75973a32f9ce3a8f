use graft::{
    Activation, AdminHandle, CommandGateway, Implant, InjectionTrigger, RouteImplant, Server,
    TriggerState,
};
use graft_core::RegistrationError;
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};
use tokio::sync::Barrier;

mod common;
use common::{body_text, evil_entries, get, lab_server};

async fn race<I: Implant>(server: Arc<Server>, trigger: Arc<InjectionTrigger<I>>, n: usize) -> Vec<Activation> {
    let barrier = Arc::new(Barrier::new(n));
    let tasks: Vec<_> = (0..n)
        .map(|_| {
            let server = Arc::clone(&server);
            let trigger = Arc::clone(&trigger);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                trigger.activate(server.context())
            })
        })
        .collect();

    let mut results = Vec::with_capacity(n);
    for task in tasks {
        results.push(task.await.unwrap().unwrap());
    }
    results
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_activations_arm_once() {
    for n in [1, 5, 50] {
        let server = Arc::new(Server::new());
        let gateway = Arc::new(CommandGateway::new("cmd"));
        let trigger = Arc::new(InjectionTrigger::new(RouteImplant::new("/evilcontroller", gateway).unwrap()));

        let results = race(Arc::clone(&server), Arc::clone(&trigger), n).await;

        let armed = results.iter().filter(|a| **a == Activation::Armed).count();
        assert_eq!(armed, 1, "n = {n}");
        assert_eq!(trigger.state(), TriggerState::Armed);
        assert_eq!(evil_entries(&server), 1, "n = {n}");
        assert_eq!(server.registry().revision(), 1, "n = {n}");
    }
}

struct SlowImplant {
    applied: AtomicUsize,
}

impl Implant for SlowImplant {
    fn name(&self) -> &str {
        "slow"
    }

    fn implant(&self, _admin: &AdminHandle) -> Result<(), RegistrationError> {
        thread::sleep(Duration::from_millis(200));
        self.applied.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_losers_see_in_progress_or_armed() {
    let server = Arc::new(Server::new());
    let trigger = Arc::new(InjectionTrigger::new(SlowImplant {
        applied: AtomicUsize::new(0),
    }));

    let results = race(Arc::clone(&server), Arc::clone(&trigger), 8).await;

    assert_eq!(results.iter().filter(|a| **a == Activation::Armed).count(), 1);
    assert!(
        results
            .iter()
            .all(|a| matches!(a, Activation::Armed | Activation::InProgress | Activation::AlreadyArmed))
    );
    assert_eq!(trigger.implant().applied.load(Ordering::SeqCst), 1);
    assert_eq!(
        trigger.activate(server.context()).unwrap(),
        Activation::AlreadyArmed
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_requests_to_trigger_endpoint() {
    let server = lab_server();

    let tasks: Vec<_> = (0..32)
        .map(|_| {
            let server = Arc::clone(&server);
            tokio::spawn(async move { body_text(&get(&server, "/inject").await) })
        })
        .collect();

    let mut done = 0;
    for task in tasks {
        let text = task.await.unwrap();
        if text.starts_with("Inject done") {
            done += 1;
        } else {
            assert!(text == "Already injected\n" || text == "Injection in progress\n", "{text}");
        }
    }
    assert_eq!(done, 1);
    assert_eq!(evil_entries(&server), 1);
}
