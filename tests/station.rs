mod common;

use std::{
    sync::{Arc, Mutex},
    thread,
};

use common::{data, settings, ScriptedConnector, Step};
use linkcom::{DecodedMessage, LinkId, MessageKind, MessageSink, Outgoing, Station};

type Delivered = Arc<Mutex<Vec<DecodedMessage>>>;

fn recording_sink() -> (Arc<dyn MessageSink>, Delivered) {
    let delivered: Delivered = Arc::default();
    let log = delivered.clone();
    (
        Arc::new(move |message: DecodedMessage| log.lock().unwrap().push(message)),
        delivered,
    )
}

#[test]
fn stop_after_a_message_exits_cleanly() {
    let connector = ScriptedConnector::new();
    let probe = connector.device("/dev/cmd", vec![data("hello MSG_END")]);
    let (sink, delivered) = recording_sink();
    let station = Station::new(
        vec![(LinkId::Command, settings("/dev/cmd"))],
        Box::new(connector),
        sink,
    );
    let stop = station.stop_handle();
    let worker = thread::spawn(move || station.run());

    assert!(common::eventually(|| delivered.lock().unwrap().len() == 1));
    assert!(stop.cancel());
    assert_eq!(worker.join().unwrap(), 0);

    let delivered = delivered.lock().unwrap();
    assert_eq!(delivered[0].kind, MessageKind::MsgEnd);
    assert_eq!(delivered[0].payload, "hello%20");
    assert_eq!(probe.reader_closed(), 1);
    assert_eq!(probe.writer_closed(), 1);
}

#[test]
fn outgoing_text_is_written_on_its_link() {
    let connector = ScriptedConnector::new();
    let command = connector.device("/dev/cmd", vec![]);
    let telemetry = connector.device("/dev/tlm", vec![]);
    let (sink, _delivered) = recording_sink();
    let station = Station::new(
        vec![
            (LinkId::Command, settings("/dev/cmd")),
            (LinkId::Telemetry, settings("/dev/tlm")),
        ],
        Box::new(connector),
        sink,
    );
    let stop = station.stop_handle();
    let outbox = station.outbox();
    let worker = thread::spawn(move || station.run());

    outbox
        .send(Outgoing {
            link: LinkId::Command,
            text: "ARM".into(),
        })
        .unwrap();
    assert!(common::eventually(|| command.written() == vec!["ARM".to_string()]));
    assert!(telemetry.written().is_empty());

    stop.cancel();
    assert_eq!(worker.join().unwrap(), 0);
}

#[test]
fn failing_link_exits_with_error() {
    let connector = ScriptedConnector::new();
    let probe = connector.device("/dev/tlm", vec![data("half"), Step::Fail]);
    let (sink, delivered) = recording_sink();
    let station = Station::new(
        vec![(LinkId::Telemetry, settings("/dev/tlm"))],
        Box::new(connector),
        sink,
    );

    assert_eq!(station.run(), 1);
    assert!(delivered.lock().unwrap().is_empty());
    assert_eq!(probe.reader_closed(), 1);
}

#[test]
fn unknown_device_exits_with_error() {
    let connector = ScriptedConnector::new();
    let (sink, _delivered) = recording_sink();
    let station = Station::new(
        vec![(LinkId::Command, settings("/dev/nowhere"))],
        Box::new(connector),
        sink,
    );

    assert_eq!(station.run(), 1);
}

#[test]
fn no_link_exits_with_error() {
    let (sink, _delivered) = recording_sink();
    let station = Station::new(
        vec![],
        Box::new(ScriptedConnector::new()),
        sink,
    );

    assert_eq!(station.run(), 1);
}

#[test]
fn stop_before_run_never_opens_a_device() {
    let connector = ScriptedConnector::new();
    let probe = connector.device("/dev/cmd", vec![data("MSG_END")]);
    let (sink, delivered) = recording_sink();
    let station = Station::new(
        vec![(LinkId::Command, settings("/dev/cmd"))],
        Box::new(connector),
        sink,
    );
    station.stop_handle().cancel();

    assert_eq!(station.run(), 0);
    assert_eq!(probe.reads(), 0);
    assert_eq!(probe.reader_closed(), 0);
    assert!(delivered.lock().unwrap().is_empty());
}
