/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::cell::RefCell;
use std::rc::Rc;

use script::dom::bindings::error::{Error, ErrorResult};
use script::dom::event::Event;
use script::dom::eventtarget::EventListener;
use script::dom::windowproxy::WindowProxy;
use script::js::{JSObject, JSVal};
use script::script_thread::ScriptThread;
use xdm_url::ImmutableOrigin;

fn origin(serialized: &str) -> ImmutableOrigin {
    ImmutableOrigin::parse_serialized(serialized).unwrap()
}

/// What a listener saw of one `message` event.
#[derive(Clone, Debug)]
struct Received {
    data: JSVal,
    origin: String,
    source: Option<WindowProxy>,
    trusted: bool,
    last_event_id: String,
    ports: usize,
}

type Inbox = Rc<RefCell<Vec<Received>>>;

fn listen(window: &WindowProxy, ty: &str) -> Inbox {
    let inbox: Inbox = Rc::new(RefCell::new(Vec::new()));
    let sink = inbox.clone();
    let listener: EventListener = Rc::new(move |event: &Event| -> ErrorResult {
        let message = event
            .as_message_event()
            .ok_or_else(|| Error::Type("not a MessageEvent".to_owned()))?;
        sink.borrow_mut().push(Received {
            data: message.data().clone(),
            origin: message.origin().to_owned(),
            source: message.source().cloned(),
            trusted: event.is_trusted(),
            last_event_id: message.last_event_id().to_owned(),
            ports: message.ports().len(),
        });
        Ok(())
    });
    window.add_event_listener(ty, listener);
    inbox
}

/// An `onmessage` handler that posts what it gets back to whoever sent it.
fn echo() -> EventListener {
    Rc::new(|event: &Event| -> ErrorResult {
        let message = event
            .as_message_event()
            .ok_or_else(|| Error::Type("not a MessageEvent".to_owned()))?;
        match message.source() {
            Some(source) => source.post_message(message.data(), message.origin(), &[]),
            None => Ok(()),
        }
    })
}

struct Page {
    thread: ScriptThread,
    parent: WindowProxy,
    child: WindowProxy,
}

fn page() -> Page {
    let thread = ScriptThread::new();
    let parent = thread.new_top_level(origin("https://parent.example"));
    let child = thread
        .new_nested(&parent, origin("https://child.example"))
        .unwrap();
    Page {
        thread,
        parent,
        child,
    }
}

#[test]
fn test_parent_posts_ack_to_child() {
    let Page {
        thread,
        parent,
        child,
    } = page();
    let inbox = listen(&child, "message");

    parent
        .run_script(|_| child.post_message(&JSVal::from("ack"), "*", &[]))
        .unwrap();
    // Nothing is delivered synchronously.
    assert!(inbox.borrow().is_empty());

    assert_eq!(thread.run_until_idle(), 1);
    let received = inbox.borrow();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].data, JSVal::from("ack"));
    assert_eq!(received[0].origin, "https://parent.example");
    assert_eq!(received[0].source, Some(parent.clone()));
    assert!(received[0].trusted);
    assert_eq!(received[0].last_event_id, "");
    assert_eq!(received[0].ports, 0);
}

#[test]
fn test_child_posts_object_to_parent() {
    let Page {
        thread,
        parent,
        child,
    } = page();
    let inbox = listen(&parent, "message");

    let sent = JSObject::from_properties([("foo", JSVal::from("bar"))]);
    child.run_script(|child| {
        let parent = child.parent().unwrap();
        parent
            .post_message(&JSVal::from(sent.clone()), "https://parent.example", &[])
            .unwrap();
    });
    // Changing the object after posting does not change the message.
    sent.set("foo", JSVal::from("changed"));
    thread.run_until_idle();

    let received = inbox.borrow();
    assert_eq!(received.len(), 1);
    let data = received[0].data.as_object().unwrap();
    assert_ne!(data, &sent);
    assert_eq!(data.get("foo"), Some(JSVal::from("bar")));
    assert_eq!(received[0].origin, "https://child.example");
    assert_eq!(received[0].source, Some(child.clone()));
}

#[test]
fn test_mismatched_origin_is_silent() {
    let Page {
        thread,
        parent,
        child,
    } = page();
    let inbox = listen(&child, "message");

    let result =
        parent.run_script(|_| child.post_message(&JSVal::from("secret"), "https://github.com", &[]));
    assert_eq!(result, Ok(()));
    assert_eq!(thread.run_until_idle(), 0);
    assert!(inbox.borrow().is_empty());
}

#[test]
fn test_iframe_to_iframe_through_the_parent() {
    let Page {
        thread,
        parent,
        child,
    } = page();
    let sibling = thread
        .new_nested(&parent, origin("https://sibling.example"))
        .unwrap();
    let inbox = listen(&sibling, "message");

    child.run_script(|child| {
        let frames = child.parent().unwrap().frames();
        assert_eq!(frames.len(), 2);
        frames[1]
            .post_message(&JSVal::from("hello sibling"), "https://sibling.example", &[])
            .unwrap();
    });
    thread.run_until_idle();

    let received = inbox.borrow();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].data, JSVal::from("hello sibling"));
    assert_eq!(received[0].origin, "https://child.example");
    assert_eq!(received[0].source, Some(child.clone()));
}

#[test]
fn test_argument_errors() {
    let Page { thread: _thread, parent, child } = page();
    parent.run_script(|_| {
        let error = child.call_post_message(&[JSVal::from("ack")]).unwrap_err();
        assert!(matches!(error, Error::Type(_)));

        let error = child
            .call_post_message(&[JSVal::from("ack"), JSVal::from("bogus targetOrigin")])
            .unwrap_err();
        assert_eq!(error.name(), "SyntaxError");

        let function = JSVal::from(JSObject::new_function("callback"));
        let error = child
            .call_post_message(&[function, JSVal::from("*")])
            .unwrap_err();
        assert_eq!(error.name(), "DataCloneError");
    });
}

#[test]
fn test_messages_arrive_in_posting_order() {
    let Page {
        thread,
        parent,
        child,
    } = page();
    let inbox = listen(&child, "message");

    parent.run_script(|_| {
        for index in 0..5 {
            child.post_message(&JSVal::from(index), "*", &[]).unwrap();
        }
    });
    thread.run_until_idle();

    let received: Vec<JSVal> = inbox.borrow().iter().map(|r| r.data.clone()).collect();
    assert_eq!(received, (0..5).map(JSVal::from).collect::<Vec<_>>());
}

#[test]
fn test_slash_means_the_callers_origin() {
    let Page {
        thread,
        parent,
        child,
    } = page();
    let same_origin = thread
        .new_nested(&parent, origin("https://parent.example"))
        .unwrap();
    let same_inbox = listen(&same_origin, "message");
    let cross_inbox = listen(&child, "message");

    parent.run_script(|_| {
        same_origin.post_message(&JSVal::from("same"), "/", &[]).unwrap();
        child.post_message(&JSVal::from("cross"), "/", &[]).unwrap();
    });
    thread.run_until_idle();

    assert_eq!(same_inbox.borrow().len(), 1);
    assert!(cross_inbox.borrow().is_empty());
}

#[test]
fn test_origin_is_checked_when_posting() {
    let Page {
        thread,
        parent,
        child,
    } = page();
    let inbox = listen(&child, "message");

    parent
        .run_script(|_| child.post_message(&JSVal::from("queued"), "https://child.example", &[]))
        .unwrap();
    // The child navigates away before the task runs; the message was already accepted.
    thread.navigate(&child, origin("https://elsewhere.example"));
    thread.run_until_idle();
    assert_eq!(inbox.borrow().len(), 1);

    parent
        .run_script(|_| child.post_message(&JSVal::from("late"), "https://child.example", &[]))
        .unwrap();
    thread.run_until_idle();
    assert_eq!(inbox.borrow().len(), 1);
}

#[test]
fn test_transfer_detaches_the_senders_buffer() {
    let Page {
        thread,
        parent,
        child,
    } = page();
    let inbox = listen(&child, "message");

    let buffer = JSObject::new_array_buffer(vec![1, 2, 3, 4]);
    let transfer = JSVal::from(JSObject::new_array(vec![JSVal::from(buffer.clone())]));
    parent
        .run_script(|_| {
            child.call_post_message(&[JSVal::from(buffer.clone()), JSVal::from("*"), transfer])
        })
        .unwrap();
    assert!(buffer.is_detached());
    assert_eq!(buffer.length(), Some(0));

    thread.run_until_idle();
    let received = inbox.borrow();
    let data = received[0].data.as_object().unwrap();
    assert_ne!(data, &buffer);
    assert_eq!(data.array_buffer_data(), Some(vec![1, 2, 3, 4]));
}

#[test]
fn test_cycles_and_shared_references_survive() {
    let Page {
        thread,
        parent,
        child,
    } = page();
    let inbox = listen(&child, "message");

    let shared = JSObject::new_ordinary();
    let message = JSObject::from_properties([
        ("left", JSVal::from(shared.clone())),
        ("right", JSVal::from(shared.clone())),
    ]);
    message.set("self", JSVal::from(message.clone()));
    parent
        .run_script(|_| child.post_message(&JSVal::from(message.clone()), "*", &[]))
        .unwrap();
    thread.run_until_idle();

    let received = inbox.borrow();
    let data = received[0].data.as_object().unwrap();
    assert_eq!(data.get("self"), Some(JSVal::from(data.clone())));
    assert_eq!(data.get("left"), data.get("right"));
    assert_ne!(data.get("left"), Some(JSVal::from(shared)));
}

#[test]
fn test_discarded_target_drops_the_message() {
    let Page {
        thread,
        parent,
        child,
    } = page();
    let inbox = listen(&child, "message");

    parent
        .run_script(|_| child.post_message(&JSVal::from("never"), "*", &[]))
        .unwrap();
    thread.discard(&child);
    assert_eq!(thread.run_until_idle(), 0);
    assert!(inbox.borrow().is_empty());

    // Posting to a discarded window is not an error either.
    assert_eq!(
        parent.run_script(|_| child.post_message(&JSVal::from("never"), "*", &[])),
        Ok(())
    );
}

#[test]
fn test_source_is_absent_once_the_sender_is_discarded() {
    let thread = ScriptThread::new();
    let opener = thread.new_top_level(origin("https://opener.example"));
    let popup = thread
        .new_auxiliary(&opener, origin("https://popup.example"))
        .unwrap();
    let inbox = listen(&opener, "message");

    popup.run_script(|popup| {
        popup
            .opener()
            .unwrap()
            .post_message(&JSVal::from("bye"), "https://opener.example", &[])
            .unwrap();
    });
    thread.discard(&popup);
    thread.run_until_idle();

    let received = inbox.borrow();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].origin, "https://popup.example");
    assert_eq!(received[0].source, None);
}

#[test]
fn test_failing_listener_does_not_stop_delivery() {
    let Page {
        thread,
        parent,
        child,
    } = page();
    let failing: EventListener =
        Rc::new(|_: &Event| Err(Error::Type("listener threw".to_owned())));
    child.add_event_listener("message", failing);
    let inbox = listen(&child, "message");

    parent
        .run_script(|_| child.post_message(&JSVal::from("still here"), "*", &[]))
        .unwrap();
    thread.run_until_idle();
    assert_eq!(inbox.borrow().len(), 1);
}

#[test]
fn test_onmessage_reply_runs_on_a_later_turn() {
    let Page {
        thread,
        parent,
        child,
    } = page();
    let replies = listen(&parent, "message");
    child.set_onmessage(Some(echo()));

    parent
        .run_script(|_| child.post_message(&JSVal::from("ping"), "*", &[]))
        .unwrap();
    assert_eq!(thread.perform_a_turn(), 1);
    assert!(replies.borrow().is_empty());
    assert_eq!(thread.perform_a_turn(), 1);

    let received = replies.borrow();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].data, JSVal::from("ping"));
    assert_eq!(received[0].origin, "https://child.example");
}

#[test]
fn test_reply_to_a_younger_context_runs_on_a_later_turn() {
    let Page {
        thread,
        parent,
        child,
    } = page();
    let replies = listen(&child, "message");
    parent.set_onmessage(Some(echo()));

    child
        .run_script(|_| parent.post_message(&JSVal::from("ping"), "*", &[]))
        .unwrap();
    assert_eq!(thread.perform_a_turn(), 1);
    assert!(replies.borrow().is_empty());
    assert_eq!(thread.perform_a_turn(), 1);
    assert!(!thread.has_pending_tasks());

    let received = replies.borrow();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].data, JSVal::from("ping"));
    assert_eq!(received[0].origin, "https://parent.example");
}

#[test]
fn test_messages_from_different_senders_keep_call_order() {
    let Page {
        thread,
        parent,
        child,
    } = page();
    let sibling = thread
        .new_nested(&parent, origin("https://sibling.example"))
        .unwrap();
    let inbox = listen(&child, "message");

    // Large objects from the parent, bare strings from the sibling.
    let heavy = |label: &str| {
        let bulk = JSObject::new_array((0..10_000).map(JSVal::from).collect());
        JSVal::from(JSObject::from_properties([
            ("label", JSVal::from(label)),
            ("bulk", JSVal::from(bulk)),
        ]))
    };
    let mut expected = Vec::new();
    for round in 0..3 {
        let label = format!("parent-{round}");
        parent
            .run_script(|_| child.post_message(&heavy(&label), "*", &[]))
            .unwrap();
        expected.push((label, "https://parent.example".to_owned()));

        let label = format!("sibling-{round}");
        sibling
            .run_script(|_| child.post_message(&JSVal::from(label.as_str()), "*", &[]))
            .unwrap();
        expected.push((label, "https://sibling.example".to_owned()));
    }
    assert_eq!(thread.run_until_idle(), 6);

    let received: Vec<(String, String)> = inbox
        .borrow()
        .iter()
        .map(|message| {
            let label = match message.data.as_object() {
                Some(object) => object.get("label").unwrap_or_default(),
                None => message.data.clone(),
            };
            let label = label.as_str().unwrap_or_default().to_owned();
            (label, message.origin.clone())
        })
        .collect();
    assert_eq!(received, expected);
}

#[test]
fn test_deepest_accepted_nesting_is_delivered() {
    let Page {
        thread,
        parent,
        child,
    } = page();
    let inbox = listen(&child, "message");
    let levels = usize::try_from(xdm_config::pref!(dom_structured_clone_max_depth)).unwrap();

    let mut message = JSVal::from("bottom");
    for _ in 0..levels {
        message = JSVal::from(JSObject::new_array(vec![message]));
    }
    parent
        .run_script(|_| child.post_message(&message, "*", &[]))
        .unwrap();
    assert_eq!(thread.run_until_idle(), 1);

    let received = inbox.borrow();
    assert_eq!(received.len(), 1);
    let mut depth = 0;
    let mut current = received[0].data.clone();
    while let Some(array) = current.as_object().cloned() {
        assert_eq!(array.length(), Some(1));
        depth += 1;
        current = array.get_index(0).unwrap_or_default();
    }
    assert_eq!(depth, levels);
    assert_eq!(current.as_str(), Some("bottom"));
}
