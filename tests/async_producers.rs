//! Driving a machine from concurrent async tasks.

use evfsm::core::{EventId, Message, StateId, StateInstance};
use evfsm::dispatch::handler::stay;
use evfsm::machine::{RunMode, StateMachine};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const READY: StateId = StateId::from_static("Ready");
const SAMPLE: EventId = EventId::from_static("async::SAMPLE");

const PRODUCERS: usize = 8;
const PER_PRODUCER: usize = 50;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_producers_keep_their_own_order() {
    let received: Arc<Mutex<Vec<(usize, usize)>>> = Arc::default();
    let sink = received.clone();

    let mut machine = StateMachine::new();
    machine.register_state::<()>(READY, "Ready");
    machine.on(
        SAMPLE,
        stay(move |_: &mut StateInstance, message| {
            let producer = message.param("producer").parse().unwrap();
            let seq = message.param("seq").parse().unwrap();
            sink.lock().unwrap().push((producer, seq));
        }),
    );
    machine.start(READY, None, RunMode::Background).unwrap();

    let tasks: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let handle = machine.machine_handle();
            tokio::spawn(async move {
                for seq in 0..PER_PRODUCER {
                    handle.handle(
                        Message::new(SAMPLE)
                            .with_param("producer", producer.to_string())
                            .with_param("seq", seq.to_string()),
                    );
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let machine = tokio::task::spawn_blocking(move || {
        machine.stop(true).unwrap();
        machine
    })
    .await
    .unwrap();
    assert!(!machine.is_running());

    let received = received.lock().unwrap();
    assert_eq!(received.len(), PRODUCERS * PER_PRODUCER);

    let mut next: HashMap<usize, usize> = HashMap::new();
    for &(producer, seq) in received.iter() {
        let expected = next.entry(producer).or_insert(0);
        assert_eq!(seq, *expected, "producer {} delivered out of order", producer);
        *expected += 1;
    }
}
