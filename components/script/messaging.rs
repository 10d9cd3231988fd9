/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use core::fmt;
use std::rc::Rc;

use crossbeam_channel::{Receiver, Sender};
use log::{debug, warn};
use xdm_url::ImmutableOrigin;

use crate::dom::bindings::structuredclone::{self, StructuredSerializedData};
use crate::dom::browsingcontext::{BrowsingContext, BrowsingContextGraph, BrowsingContextId};
use crate::dom::messageevent::MessageEvent;
use crate::dom::windowproxy::WindowProxy;
use crate::task::TaskBox;
use crate::task_source::TaskSourceName;

/// Common messages used to control the event loops of browsing contexts.
pub enum CommonScriptMsg {
    /// Generic message that encapsulates event handling.
    Task(TaskSourceName, Box<dyn TaskBox>, BrowsingContextId),
}

impl fmt::Debug for CommonScriptMsg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            CommonScriptMsg::Task(ref name, ref task, ref context) => f
                .debug_tuple("Task")
                .field(name)
                .field(task)
                .field(context)
                .finish(),
        }
    }
}

/// The sending half of a browsing context's task queue.
pub type ScriptEventLoopSender = Sender<CommonScriptMsg>;

/// The receiving half of a browsing context's task queue.
pub type ScriptEventLoopReceiver = Receiver<CommonScriptMsg>;

/// A message accepted by `postMessage`, waiting to be delivered.
#[derive(Debug)]
pub struct PostedMessage {
    /// The browsing context the message is for.
    pub target: BrowsingContextId,
    /// The browsing context that posted it.
    pub source: BrowsingContextId,
    /// The origin of the source when the message was posted.
    /// <https://html.spec.whatwg.org/multipage/#dom-messageevent-origin>
    pub source_origin: ImmutableOrigin,
    /// The data to be posted.
    pub data: StructuredSerializedData,
    /// Order in which messages were accepted, across every browsing context.
    pub sequence: u64,
}

/// Why an accepted `postMessage` call never produced an event.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DropReason {
    /// The target's origin did not match the requested target origin.
    OriginMismatch,
    /// The target was discarded before the message could be delivered.
    TargetDiscarded,
}

/// What became of a posted message. Script never observes this; it exists for logging
/// and for the embedder's tests.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeliveryOutcome {
    /// Queued on the target's posted message task source.
    Scheduled,
    /// A `message` or `messageerror` event was fired at the target.
    Delivered,
    Dropped(DropReason),
}

/// Queues the task that will deliver `message` on the target's event loop.
pub(crate) fn queue_posted_message(
    target: &BrowsingContext,
    message: PostedMessage,
) -> DeliveryOutcome {
    let sequence = message.sequence;
    let task = task!(post_message: move |graph| {
        let target = message.target;
        let outcome = deliver_posted_message(graph, message);
        debug!("Posted message #{sequence} for {target}: {outcome:?}");
    });
    if target
        .task_queue()
        .task_source(TaskSourceName::PostedMessage)
        .queue(task)
    {
        debug!("Queued posted message #{sequence} for {}", target.id());
        DeliveryOutcome::Scheduled
    } else {
        DeliveryOutcome::Dropped(DropReason::TargetDiscarded)
    }
}

/// The body of the task queued by [`queue_posted_message`]: deserialize the data in the
/// target and fire a `message` event at it, or a `messageerror` event if the data can
/// not be read.
pub(crate) fn deliver_posted_message(
    graph: &Rc<BrowsingContextGraph>,
    message: PostedMessage,
) -> DeliveryOutcome {
    let PostedMessage {
        target,
        source,
        source_origin,
        data,
        sequence,
    } = message;

    let Some(target) = graph.get(target) else {
        return DeliveryOutcome::Dropped(DropReason::TargetDiscarded);
    };

    // The source may have been discarded since it posted; the event then has none.
    let source = WindowProxy::from_graph(graph, source);
    let origin = source_origin.ascii_serialization();

    match structuredclone::read(data) {
        Ok(data) => MessageEvent::dispatch_jsval(&target, data, origin, source),
        Err(error) => {
            warn!("Failed to deserialize posted message #{sequence}: {error}");
            MessageEvent::dispatch_error(&target, origin, source);
        },
    }
    DeliveryOutcome::Delivered
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::dom::bindings::structuredclone::SerializedValue;
    use crate::dom::event::Event;
    use crate::dom::eventtarget::EventListener;

    fn origin(serialized: &str) -> ImmutableOrigin {
        ImmutableOrigin::parse_serialized(serialized).unwrap()
    }

    fn message(
        target: BrowsingContextId,
        source: BrowsingContextId,
        serialized: SerializedValue,
    ) -> PostedMessage {
        PostedMessage {
            target,
            source,
            source_origin: origin("https://sender.example"),
            data: StructuredSerializedData {
                serialized,
                transferred: vec![],
            },
            sequence: 0,
        }
    }

    fn record(graph: &BrowsingContextGraph, id: BrowsingContextId) -> Rc<RefCell<Vec<String>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let context = graph.get(id).unwrap();
        for type_ in ["message", "messageerror"] {
            let log = log.clone();
            let listener: EventListener = Rc::new(move |event: &Event| {
                let message = event.as_message_event().unwrap();
                log.borrow_mut().push(format!(
                    "{} {:?} from {}",
                    event.type_(),
                    message.data().as_str(),
                    message.origin()
                ));
                Ok(())
            });
            context.event_target().add_event_listener(type_, listener);
        }
        log
    }

    #[test]
    fn test_deliver_fires_message_event() {
        let graph = Rc::new(BrowsingContextGraph::new());
        let source = graph.new_top_level(origin("https://sender.example"));
        let target = graph.new_top_level(origin("https://receiver.example"));
        let log = record(&graph, target);

        let outcome = deliver_posted_message(
            &graph,
            message(target, source, SerializedValue::String("ack".into())),
        );
        assert_eq!(outcome, DeliveryOutcome::Delivered);
        assert_eq!(
            *log.borrow(),
            vec![r#"message Some("ack") from https://sender.example"#]
        );
    }

    #[test]
    fn test_malformed_data_fires_messageerror() {
        let graph = Rc::new(BrowsingContextGraph::new());
        let source = graph.new_top_level(origin("https://sender.example"));
        let target = graph.new_top_level(origin("https://receiver.example"));
        let log = record(&graph, target);

        let outcome =
            deliver_posted_message(&graph, message(target, source, SerializedValue::Reference(3)));
        assert_eq!(outcome, DeliveryOutcome::Delivered);
        assert_eq!(
            *log.borrow(),
            vec!["messageerror None from https://sender.example"]
        );
    }

    #[test]
    fn test_deliver_to_discarded_target_is_dropped() {
        let graph = Rc::new(BrowsingContextGraph::new());
        let source = graph.new_top_level(origin("https://sender.example"));
        let target = graph.new_top_level(origin("https://receiver.example"));
        graph.discard(target);

        let outcome = deliver_posted_message(
            &graph,
            message(target, source, SerializedValue::Undefined),
        );
        assert_eq!(
            outcome,
            DeliveryOutcome::Dropped(DropReason::TargetDiscarded)
        );
    }

    #[test]
    fn test_queue_for_discarded_target_is_dropped() {
        let graph = Rc::new(BrowsingContextGraph::new());
        let source = graph.new_top_level(origin("https://sender.example"));
        let target = graph.new_top_level(origin("https://receiver.example"));
        let context = graph.get(target).unwrap();
        assert_eq!(
            queue_posted_message(
                &context,
                message(target, source, SerializedValue::Null)
            ),
            DeliveryOutcome::Scheduled
        );

        graph.discard(target);
        assert_eq!(
            queue_posted_message(
                &context,
                message(target, source, SerializedValue::Null)
            ),
            DeliveryOutcome::Dropped(DropReason::TargetDiscarded)
        );
        assert!(context.task_queue().is_empty());
    }
}
