//! Dispatch engine behavior against a scripted handle.

mod common;

use common::{shared_state, stage_inbound, StubHandle, StubWatcher};
use manifold::{Bytes, ManifoldError, Readiness, Socket, SocketType};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn stub_socket(socket_type: SocketType) -> (Socket, common::SharedState) {
    let state = shared_state();
    let socket = Socket::from_parts(
        socket_type,
        Box::new(StubHandle::new(Rc::clone(&state))),
        Box::new(StubWatcher::new(Rc::clone(&state))),
    );
    (socket, state)
}

fn sent_payloads(state: &common::SharedState) -> Vec<(Vec<u8>, bool)> {
    state
        .borrow()
        .sent
        .iter()
        .map(|(p, more)| (p.to_vec(), *more))
        .collect()
}

#[test]
fn test_fifo_order_and_more_flags() {
    let (socket, state) = stub_socket(SocketType::Push);
    state.borrow_mut().readiness = Readiness::WRITABLE;

    socket.send(["a", "b", "c"]).unwrap();
    socket.send(["d", "e"]).unwrap();

    assert_eq!(
        sent_payloads(&state),
        vec![
            (b"a".to_vec(), true),
            (b"b".to_vec(), true),
            (b"c".to_vec(), false),
            (b"d".to_vec(), true),
            (b"e".to_vec(), false),
        ]
    );
    assert_eq!(socket.pending_sends(), 0);
}

#[test]
fn test_send_queues_while_unwritable_and_flushes_on_readiness() {
    let (socket, state) = stub_socket(SocketType::Push);

    socket.send(["queued"]).unwrap();
    assert_eq!(socket.pending_sends(), 1);
    assert!(state.borrow().sent.is_empty());

    state.borrow_mut().readiness = Readiness::WRITABLE;
    socket.notify_readiness().unwrap();

    assert_eq!(sent_payloads(&state), vec![(b"queued".to_vec(), false)]);
    assert_eq!(socket.pending_sends(), 0);
}

#[test]
fn test_writability_rechecked_after_every_send() {
    let (socket, state) = stub_socket(SocketType::Push);
    {
        let mut state = state.borrow_mut();
        state.readiness = Readiness::WRITABLE;
        state.writable_budget = Some(2);
    }

    socket.send(["a", "b", "c", "d"]).unwrap();

    // Budget exhausts after two parts; the rest stays queued for the next
    // writability notification.
    assert_eq!(state.borrow().sent.len(), 2);
    assert_eq!(socket.pending_sends(), 2);

    {
        let mut state = state.borrow_mut();
        state.readiness = Readiness::WRITABLE;
        state.writable_budget = None;
    }
    socket.notify_readiness().unwrap();
    assert_eq!(state.borrow().sent.len(), 4);
    assert_eq!(socket.pending_sends(), 0);
}

#[test]
fn test_empty_queue_with_writable_handle_is_a_no_op() {
    let (socket, state) = stub_socket(SocketType::Push);
    state.borrow_mut().readiness = Readiness::WRITABLE;

    // Must terminate without sending anything.
    socket.notify_readiness().unwrap();
    assert!(state.borrow().sent.is_empty());
}

#[test]
fn test_multipart_message_emitted_whole() {
    let (socket, state) = stub_socket(SocketType::Pull);
    stage_inbound(&state, &[b"envelope", b"", b"body"]);

    let received: Rc<RefCell<Vec<Vec<Vec<u8>>>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&received);
    socket.on_message(move |parts| {
        sink.borrow_mut()
            .push(parts.iter().map(|p| p.to_vec()).collect());
    });

    socket.notify_readiness().unwrap();

    let received = received.borrow();
    assert_eq!(received.len(), 1);
    assert_eq!(
        received[0],
        vec![b"envelope".to_vec(), b"".to_vec(), b"body".to_vec()]
    );
}

#[test]
fn test_burst_drains_multiple_staged_messages() {
    let (socket, state) = stub_socket(SocketType::Pull);
    stage_inbound(&state, &[b"first"]);
    stage_inbound(&state, &[b"second", b"tail"]);

    let count = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&count);
    socket.on_message(move |_| counter.set(counter.get() + 1));

    socket.notify_readiness().unwrap();
    assert_eq!(count.get(), 2);
}

#[test]
fn test_listener_send_does_not_nest_activations() {
    let (socket, state) = stub_socket(SocketType::Rep);
    state.borrow_mut().readiness = Readiness::WRITABLE;
    stage_inbound(&state, &[b"ping"]);
    stage_inbound(&state, &[b"ping"]);

    let in_handler = Rc::new(Cell::new(false));
    let nested = Rc::new(Cell::new(false));
    let flag = Rc::clone(&in_handler);
    let saw_nested = Rc::clone(&nested);
    let replier = socket.clone();
    socket.on_message(move |_| {
        if flag.get() {
            saw_nested.set(true);
        }
        flag.set(true);
        // Re-entrant send and notify must only append work, not recurse.
        replier.send(["pong"]).unwrap();
        replier.notify_readiness().unwrap();
        flag.set(false);
    });

    socket.notify_readiness().unwrap();

    assert!(!nested.get(), "listeners ran nested inside each other");
    assert_eq!(
        sent_payloads(&state),
        vec![(b"pong".to_vec(), false), (b"pong".to_vec(), false)]
    );
}

#[test]
fn test_send_failure_raises_error_event_with_diagnostics() {
    let (socket, state) = stub_socket(SocketType::Push);
    {
        let mut state = state.borrow_mut();
        state.readiness = Readiness::WRITABLE;
        state.fail_sends = true;
    }

    let seen: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    socket.on_error(move |event| {
        assert!(matches!(event.error, ManifoldError::Transport(_)));
        assert!(event.readiness.contains(Readiness::WRITABLE));
        sink.borrow_mut()
            .push(event.backlog.iter().map(ToString::to_string).collect::<Vec<_>>().join(","));
    });

    // First part fails in-flight; the remaining two stay queued and show up
    // in the event's backlog snapshot.
    socket.send(["a", "bb", "ccc"]).unwrap();

    assert_eq!(seen.borrow().as_slice(), ["2+more,3"]);
    assert_eq!(socket.pending_sends(), 2);
}

#[test]
fn test_unconsumed_error_propagates_to_caller() {
    let (socket, state) = stub_socket(SocketType::Push);
    {
        let mut state = state.borrow_mut();
        state.readiness = Readiness::WRITABLE;
        state.fail_sends = true;
    }

    let err = socket.send(["doomed"]).unwrap_err();
    assert!(matches!(err, ManifoldError::Transport(_)));

    // The engine must not stay locked after a propagated failure.
    state.borrow_mut().fail_sends = false;
    socket.send(["retry"]).unwrap();
    assert_eq!(sent_payloads(&state), vec![(b"retry".to_vec(), false)]);
}

#[test]
fn test_recv_failure_is_reported_not_swallowed() {
    let (socket, state) = stub_socket(SocketType::Pull);
    // Readable with nothing staged makes the stub's recv fail.
    state.borrow_mut().readiness = Readiness::READABLE;

    let err = socket.notify_readiness().unwrap_err();
    assert!(matches!(err, ManifoldError::Transport(_)));
}

#[test]
fn test_close_stops_watcher_before_handle() {
    let (socket, state) = stub_socket(SocketType::Pair);
    socket.close().unwrap();

    let log = state.borrow().log.clone();
    let stop = log.iter().position(|e| e == "watcher:stop");
    let close = log.iter().position(|e| e == "handle:close");
    assert!(stop.is_some() && close.is_some());
    assert!(stop < close, "watcher must stop before the handle closes");
}

#[test]
fn test_close_from_listener_aborts_the_burst() {
    let (socket, state) = stub_socket(SocketType::Pull);
    stage_inbound(&state, &[b"first"]);
    stage_inbound(&state, &[b"never delivered"]);

    let count = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&count);
    let closer = socket.clone();
    socket.on_message(move |_| {
        counter.set(counter.get() + 1);
        closer.close().unwrap();
    });

    socket.notify_readiness().unwrap();

    assert_eq!(count.get(), 1);
    assert!(!state.borrow().open);
    assert!(state.borrow().sent.is_empty());
}

#[test]
fn test_operations_after_close_fail() {
    let (socket, _state) = stub_socket(SocketType::Pair);
    socket.close().unwrap();

    assert!(matches!(
        socket.send(["late"]).unwrap_err(),
        ManifoldError::SocketClosed
    ));
    assert!(matches!(
        socket.bind_sync("loopback://x").unwrap_err(),
        ManifoldError::SocketClosed
    ));
    assert!(matches!(
        socket.close().unwrap_err(),
        ManifoldError::SocketClosed
    ));
}

#[test]
fn test_notify_after_close_is_a_quiet_no_op() {
    let (socket, state) = stub_socket(SocketType::Pull);
    stage_inbound(&state, &[b"stale"]);
    socket.close().unwrap();

    socket.notify_readiness().unwrap();
    assert_eq!(state.borrow().inbound.len(), 1, "nothing drained after close");
}

#[test]
fn test_failed_bind_leaves_watcher_running() {
    let (socket, state) = stub_socket(SocketType::Rep);
    state.borrow_mut().fail_bind = true;

    assert!(socket.bind_sync("loopback://refused").is_err());

    let log = state.borrow().log.clone();
    // stop, attempt, restart: the watcher must come back even on failure.
    assert_eq!(
        log,
        vec![
            "watcher:start".to_string(),
            "watcher:stop".to_string(),
            "handle:bind loopback://refused".to_string(),
            "watcher:start".to_string(),
        ]
    );
}

#[test]
fn test_bind_reports_through_completion_callback() {
    let (socket, _state) = stub_socket(SocketType::Rep);

    let outcome = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&outcome);
    socket.bind("loopback://cb", move |result| {
        *sink.borrow_mut() = Some(result.is_ok());
    });

    assert_eq!(*outcome.borrow(), Some(true));
}

#[test]
fn test_request_reply_round_trip_with_scripted_peer() {
    let (socket, state) = stub_socket(SocketType::Req);
    state.borrow_mut().readiness = Readiness::WRITABLE;

    socket.send(["ping"]).unwrap();
    assert_eq!(sent_payloads(&state), vec![(b"ping".to_vec(), false)]);

    let replies = socket.messages();
    stage_inbound(&state, &[b"pong"]);
    socket.notify_readiness().unwrap();

    let reply = replies.try_recv().unwrap();
    assert_eq!(reply, vec![Bytes::from_static(b"pong")]);
}
