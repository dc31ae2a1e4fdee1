// Exercises the dispatch core end to end: routing, per-conversation
// ordering, wait_next continuation delivery, worker lifecycle, and the
// teardown/enqueue race.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use courier_core::{
    ChatId, CommandParser, IncomingMessage, MessageId, ReplyFormat, ReplySender, UserId,
};
use courier_dispatch::{BotRequest, DispatchError, Dispatcher, Router};

struct NullSender;

#[async_trait]
impl ReplySender for NullSender {
    async fn send_text(
        &self,
        _chat: ChatId,
        _text: &str,
        _reply_to: Option<MessageId>,
        _format: ReplyFormat,
    ) -> courier_core::Result<MessageId> {
        Ok(MessageId(0))
    }

    async fn send_typing(&self, _chat: ChatId) -> courier_core::Result<()> {
        Ok(())
    }
}

fn dispatcher(router: Router) -> Dispatcher {
    Dispatcher::new(
        CommandParser::new("courier_bot").unwrap(),
        router,
        Arc::new(NullSender),
        10,
    )
}

fn msg(chat: i64, sender: i64, id: i64, text: &str) -> IncomingMessage {
    IncomingMessage {
        chat: ChatId(chat),
        sender: UserId(sender),
        message_id: MessageId(id),
        text: text.to_string(),
        sender_name: None,
    }
}

/// Receive with a deadline so a broken test fails instead of hanging.
async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for handler")
        .expect("channel closed")
}

/// Wait until the dispatcher has no live conversations left.
async fn drained(dispatcher: &Dispatcher) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !dispatcher.registry().is_empty().await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("conversations never drained");
}

#[tokio::test]
async fn routes_command_to_matching_handler() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut router = Router::new();
    router.register("greet", move |req: BotRequest| {
        let tx = tx.clone();
        async move {
            tx.send((req.command.clone(), req.args.clone())).unwrap();
        }
    });

    let d = dispatcher(router);
    d.dispatch(msg(1, 7, 1, "/greet hello there")).await;

    let (command, args) = recv(&mut rx).await;
    assert_eq!(command.as_deref(), Some("greet"));
    assert_eq!(args, "hello there");
    drained(&d).await;
}

#[tokio::test]
async fn same_conversation_is_processed_in_arrival_order() {
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let seen_in_handler = Arc::clone(&seen);
    let mut router = Router::new();
    router.register("echo", move |req: BotRequest| {
        let seen = Arc::clone(&seen_in_handler);
        async move {
            seen.lock().unwrap().push(req.args.clone());
        }
    });

    // 25 messages against a capacity-10 mailbox: later dispatches ride the
    // backpressure path while the worker drains concurrently.
    let d = dispatcher(router);
    for i in 0..25 {
        d.dispatch(msg(1, 7, i, &format!("/echo {i}"))).await;
    }
    drained(&d).await;

    let expected: Vec<String> = (0..25).map(|i| i.to_string()).collect();
    assert_eq!(*seen.lock().unwrap(), expected);
}

#[tokio::test]
async fn continuation_is_delivered_to_wait_next() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut router = Router::new();
    router.register("start", move |req: BotRequest| {
        let tx = tx.clone();
        async move {
            let next = req.wait_next().await.expect("continuation");
            tx.send(next.text().to_string()).unwrap();
        }
    });

    let d = dispatcher(router);
    d.dispatch(msg(1, 7, 1, "/start")).await;
    // Bare text for the same (chat, sender): continues the conversation and
    // must come back as the wait_next return value, not spawn anything.
    d.dispatch(msg(1, 7, 2, "hello")).await;

    assert_eq!(recv(&mut rx).await, "hello");
    drained(&d).await;
}

#[tokio::test]
async fn wait_timeout_fires_once_and_preserves_the_message() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut router = Router::new();
    router.register("start", move |req: BotRequest| {
        let tx = tx.clone();
        async move {
            let first = req.wait_next_timeout(Duration::from_millis(50)).await;
            let label = match first {
                Err(DispatchError::WaitTimeout { .. }) => "timeout".to_string(),
                Ok(next) => format!("message:{}", next.text()),
                Err(other) => format!("error:{other}"),
            };
            tx.send(format!("first:{label}")).unwrap();

            let second = req.wait_next().await.expect("continuation");
            tx.send(format!("second:{}", second.text())).unwrap();
        }
    });

    let d = dispatcher(router);
    d.dispatch(msg(1, 7, 1, "/start")).await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    d.dispatch(msg(1, 7, 2, "late")).await;

    assert_eq!(recv(&mut rx).await, "first:timeout");
    assert_eq!(recv(&mut rx).await, "second:late");
    drained(&d).await;
}

#[tokio::test]
async fn unknown_command_is_consumed_and_conversation_tears_down() {
    let invoked = Arc::new(AtomicUsize::new(0));
    let invoked_in_handler = Arc::clone(&invoked);
    let mut router = Router::new();
    router.register("known", move |_req: BotRequest| {
        let invoked = Arc::clone(&invoked_in_handler);
        async move {
            invoked.fetch_add(1, Ordering::SeqCst);
        }
    });

    let d = dispatcher(router);
    d.dispatch(msg(1, 7, 1, "/bogus")).await;
    drained(&d).await;
    assert_eq!(invoked.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn bare_text_never_starts_a_conversation() {
    let d = dispatcher(Router::new());
    d.dispatch(msg(1, 7, 1, "hello")).await;
    assert!(d.registry().is_empty().await);
}

#[tokio::test]
async fn conversations_run_on_independent_workers() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let tx_slow = tx.clone();
    let mut router = Router::new();
    router.register("slow", move |_req: BotRequest| {
        let tx = tx_slow.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            tx.send("slow").unwrap();
        }
    });
    router.register("fast", move |_req: BotRequest| {
        let tx = tx.clone();
        async move {
            tx.send("fast").unwrap();
        }
    });

    let d = dispatcher(router);
    d.dispatch(msg(1, 7, 1, "/slow")).await;
    d.dispatch(msg(2, 9, 2, "/fast")).await;

    // The second conversation finishes first: its worker is not behind the
    // slow handler of the first one.
    assert_eq!(recv(&mut rx).await, "fast");
    assert_eq!(recv(&mut rx).await, "slow");
    drained(&d).await;
}

#[tokio::test]
async fn at_most_one_handler_in_flight_per_conversation() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let in_flight_h = Arc::clone(&in_flight);
    let peak_h = Arc::clone(&peak);

    let mut router = Router::new();
    router.register("work", move |_req: BotRequest| {
        let in_flight = Arc::clone(&in_flight_h);
        let peak = Arc::clone(&peak_h);
        async move {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
        }
    });

    let d = dispatcher(router);
    for i in 0..8 {
        d.dispatch(msg(1, 7, i, "/work")).await;
    }
    drained(&d).await;
    assert_eq!(peak.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn handler_panic_aborts_only_its_own_message() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut router = Router::new();
    router.register("boom", |_req: BotRequest| async {
        panic!("handler blew up");
    });
    router.register("ok", move |req: BotRequest| {
        let tx = tx.clone();
        async move {
            tx.send(req.args.clone()).unwrap();
        }
    });

    let d = dispatcher(router);
    d.dispatch(msg(1, 7, 1, "/boom")).await;
    d.dispatch(msg(1, 7, 2, "/ok after")).await;

    assert_eq!(recv(&mut rx).await, "after");
    drained(&d).await;
}

// The hot teardown race: a worker observing its queue empty while the
// dispatcher is enqueueing for the same key. Short-lived handlers make the
// create/teardown cycle spin constantly; every message must be handled.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn teardown_race_never_loses_messages() {
    let handled = Arc::new(AtomicUsize::new(0));
    let handled_in_handler = Arc::clone(&handled);
    let mut router = Router::new();
    router.register("ping", move |_req: BotRequest| {
        let handled = Arc::clone(&handled_in_handler);
        async move {
            handled.fetch_add(1, Ordering::SeqCst);
        }
    });

    let d = Arc::new(dispatcher(router));
    let mut senders = Vec::new();
    for task in 0..4u32 {
        let d = Arc::clone(&d);
        senders.push(tokio::spawn(async move {
            for i in 0..100u32 {
                let id = i64::from(task * 100 + i);
                d.dispatch(msg(1, 7, id, "/ping")).await;
            }
        }));
    }
    for sender in senders {
        sender.await.unwrap();
    }
    drained(&d).await;

    assert_eq!(handled.load(Ordering::SeqCst), 400);
}
