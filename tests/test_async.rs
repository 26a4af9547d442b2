//! Callback-driven invocation path.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use bytes::Bytes;
use http_connector::{
    error::ProcessingError,
    http::Method,
    test::{self, CapturingHandler, MockResponse},
    CallOutcome, CompletionHandler, Properties, Request, Response,
};

#[test]
fn async_get_delivers_exactly_one_response() {
    let _ = env_logger::builder().is_test(true).try_init();

    let connector = test::connector(&Properties::new()).unwrap();
    connector
        .engine()
        .handle(|_| Ok(MockResponse::new(200).body("GET")));

    let handler = CapturingHandler::new();
    let handle = connector.send_async(Request::get("http://localhost/test"), handler.clone());

    let outcome = handle.wait();
    assert_eq!(outcome.status().map(|s| s.as_u16()), Some(200));

    assert_eq!(handler.response_count(), 1);
    assert_eq!(handler.failure_count(), 0);
    let (status, body) = handler.responses().remove(0);
    assert_eq!(status.as_u16(), 200);
    assert_eq!(body, Bytes::from("GET"));
}

#[test]
fn engine_failure_reaches_only_the_failure_path() {
    let connector = test::connector(&Properties::new()).unwrap();
    connector.engine().handle(|_| Err("wire cut".to_owned()));

    let handler = CapturingHandler::new();
    let handle = connector.send_async(Request::get("http://localhost/test"), handler.clone());

    match handle.wait() {
        CallOutcome::Failed(err) => assert!(err.to_string().contains("wire cut")),
        CallOutcome::Completed(status) => panic!("unexpected completion: {status}"),
    }
    assert_eq!(handler.response_count(), 0);
    assert_eq!(handler.failure_count(), 1);
}

#[test]
fn unsupported_method_is_delivered_through_the_handler() {
    let connector = test::connector(&Properties::new()).unwrap();

    let handler = CapturingHandler::new();
    let handle = connector.send_async(
        Request::new(Method::PATCH, "http://localhost/test"),
        handler.clone(),
    );

    let outcome = handle.wait();
    assert!(!outcome.is_completed());
    assert_eq!(handler.failure_count(), 1);
    assert!(matches!(
        *handler.failures()[0],
        ProcessingError::Method(_)
    ));
    assert_eq!(connector.engine().send_count(), 0);
}

#[test]
fn synchronous_send_failure_still_fires_the_handler_once() {
    let props = Properties::new().with(test::FAIL_SEND, true);
    let connector = test::connector(&props).unwrap();

    let handler = CapturingHandler::new();
    let handle = connector.send_async(Request::get("http://localhost/test"), handler.clone());

    let outcome = handle.wait();
    assert!(!outcome.is_completed());
    assert_eq!(handler.failure_count(), 1);
    assert_eq!(handler.response_count(), 0);
    assert!(matches!(
        *handler.failures()[0],
        ProcessingError::Engine(_)
    ));
}

#[test]
fn streamed_entity_reaches_the_server_whole() {
    let connector = test::connector(&Properties::new()).unwrap();
    connector.engine().handle(|req| {
        let body = req.body.clone().unwrap_or_default();
        Ok(MockResponse::new(200).body(body))
    });

    let payload = "chunked entity payload that outgrows a single write";
    let handler = CapturingHandler::new();
    let handle = connector.send_async(
        Request::post("http://localhost/echo").body_writer({
            let payload = payload.to_owned();
            move |out: &mut dyn std::io::Write| {
                // two writes become two pipe chunks
                let (a, b) = payload.as_bytes().split_at(payload.len() / 2);
                out.write_all(a)?;
                out.write_all(b)
            }
        }),
        handler.clone(),
    );

    assert!(handle.wait().is_completed());
    let (_, body) = handler.responses().remove(0);
    assert_eq!(body, Bytes::from(payload));
}

#[test]
fn response_body_streams_while_the_handler_reads() {
    let connector = test::connector(&Properties::new()).unwrap();
    let long_body = "the engine delivers this body in more than one chunk".repeat(8);
    {
        let long_body = long_body.clone();
        connector
            .engine()
            .handle(move |_| Ok(MockResponse::new(200).body(long_body.clone())));
    }

    let handler = CapturingHandler::new();
    let handle = connector.send_async(Request::get("http://localhost/big"), handler.clone());

    assert!(handle.wait().is_completed());
    let (_, body) = handler.responses().remove(0);
    assert_eq!(body, Bytes::from(long_body));
}

#[test]
fn calls_settle_independently() {
    let connector = test::connector(&Properties::new()).unwrap();
    connector.engine().handle(|req| {
        Ok(MockResponse::new(200).body(req.path().trim_start_matches('/').to_owned()))
    });

    let handler = CapturingHandler::new();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            connector.send_async(
                Request::get(format!("http://localhost/{i}")),
                handler.clone(),
            )
        })
        .collect();

    for handle in handles {
        assert!(handle.wait().is_completed());
    }

    assert_eq!(handler.response_count(), 8);
    assert_eq!(handler.failure_count(), 0);

    let mut bodies: Vec<_> = handler
        .responses()
        .into_iter()
        .map(|(_, body)| String::from_utf8(body.to_vec()).unwrap())
        .collect();
    bodies.sort();
    let expected: Vec<_> = (0..8).map(|i| i.to_string()).collect();
    assert_eq!(bodies, expected);
}

#[tokio::test]
async fn handle_can_be_awaited() {
    let connector = test::connector(&Properties::new()).unwrap();
    connector
        .engine()
        .handle(|_| Ok(MockResponse::new(201).body("made")));

    let handler = CapturingHandler::new();
    let handle = connector.send_async(Request::get("http://localhost/new"), handler.clone());

    let outcome = handle.await;
    assert_eq!(outcome.status().map(|s| s.as_u16()), Some(201));
    assert_eq!(handler.response_count(), 1);
}

#[test]
fn handle_resolves_only_after_the_handler_ran() {
    struct OrderProbe {
        order: Arc<Mutex<Vec<&'static str>>>,
    }

    impl CompletionHandler for OrderProbe {
        fn on_response(&mut self, _response: Response) {
            self.order.lock().unwrap().push("handler");
        }

        fn on_failure(&mut self, _error: Arc<ProcessingError>) {
            self.order.lock().unwrap().push("handler-failure");
        }
    }

    let connector = test::connector(&Properties::new()).unwrap();
    connector.engine().handle(|_| Ok(MockResponse::new(200)));

    let order = Arc::new(Mutex::new(Vec::new()));
    let handle = connector.send_async(
        Request::get("http://localhost/test"),
        OrderProbe {
            order: Arc::clone(&order),
        },
    );

    handle.wait();
    order.lock().unwrap().push("handle");

    assert_eq!(*order.lock().unwrap(), ["handler", "handle"]);
}

#[test]
fn many_sequential_async_calls_reuse_one_engine() {
    let connector = test::connector(&Properties::new()).unwrap();
    let served = Arc::new(AtomicUsize::new(0));
    {
        let served = Arc::clone(&served);
        connector.engine().handle(move |_| {
            served.fetch_add(1, Ordering::SeqCst);
            Ok(MockResponse::new(200))
        });
    }

    for _ in 0..20 {
        let handler = CapturingHandler::new();
        let handle = connector.send_async(Request::get("http://localhost/test"), handler);
        assert!(handle.wait().is_completed());
    }

    assert_eq!(served.load(Ordering::SeqCst), 20);
    assert_eq!(connector.engine().send_count(), 20);
}
