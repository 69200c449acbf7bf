/// External control over a full default board
///
/// Notes address chain positions; the controller sweeps every binding
/// that follows the expression pedal.
use pedalboard::{
    ControlEvent, PedalKind, Pedalboard, PedalboardConfig, Routed, UnroutableControlEvent,
};

fn default_board() -> pedalboard::PedalboardControl {
    let config = PedalboardConfig {
        max_loop_seconds: 1.0,
        ..PedalboardConfig::default()
    };
    let (_, control) = Pedalboard::new(&config).unwrap().into_parts();
    control
}

fn active_states(control: &pedalboard::PedalboardControl) -> Vec<bool> {
    control.chain().units().iter().map(|u| u.is_active()).collect()
}

#[test]
fn test_note_toggles_only_its_position() {
    let mut control = default_board();
    assert!(control.failures().is_empty());
    assert_eq!(control.chain().unit(3).unwrap().kind(), PedalKind::Wah);

    let before = active_states(&control);
    let routed = control.route(ControlEvent::Note { index: 3 }).unwrap();
    assert_eq!(routed, Routed::Toggled { index: 3, active: true });

    let after = active_states(&control);
    for (i, (b, a)) in before.iter().zip(&after).enumerate() {
        if i + 1 == 3 {
            assert_ne!(b, a, "unit 3 should have flipped");
        } else {
            assert_eq!(b, a, "unit {} must not change", i + 1);
        }
    }

    control.route(ControlEvent::Note { index: 3 }).unwrap();
    assert_eq!(active_states(&control), before);
}

#[test]
fn test_unoccupied_index_is_unroutable() {
    let mut control = default_board();
    let before = active_states(&control);
    assert_eq!(
        control.route(ControlEvent::Note { index: 40 }),
        Err(UnroutableControlEvent::Note(40))
    );
    // The looper has no bypass
    let looper = control.chain().find(PedalKind::Loop).unwrap().index() as u8;
    assert_eq!(
        control.route(ControlEvent::Note { index: looper }),
        Err(UnroutableControlEvent::Note(looper))
    );
    assert_eq!(active_states(&control), before);
}

#[test]
fn test_controller_fans_out_to_every_continuous_binding() {
    let mut control = default_board();
    // Wah filter plus one chorus rate per multi-head delay head
    assert_eq!(control.router().continuous_bindings().len(), 5);

    let routed = control.route(ControlEvent::Controller { value: 64 }).unwrap();
    assert_eq!(routed, Routed::Controller { bindings: 5 });

    let wah = control.chain().find(PedalKind::Wah).unwrap();
    let filter = wah.binding("filter").unwrap().value();
    let expected = 100.0 + (64.0 / 127.0) * 1400.0;
    assert!(
        (filter - expected).abs() < 1e-2,
        "filter should sit at {}, got {}",
        expected,
        filter
    );

    let multihead = control.chain().find(PedalKind::MultiheadDelay).unwrap();
    for head in 1..=4 {
        let rate = multihead.binding(&format!("head{}.rate", head)).unwrap().value();
        assert!((rate - (64.0 / 127.0) * 4.0).abs() < 1e-4);
    }
}

#[test]
fn test_controller_extremes() {
    let mut control = default_board();
    control.route(ControlEvent::Controller { value: 0 }).unwrap();
    let wah = control.chain().find(PedalKind::Wah).unwrap();
    assert_eq!(wah.binding("filter").unwrap().value(), 100.0);

    control.route(ControlEvent::Controller { value: 127 }).unwrap();
    let wah = control.chain().find(PedalKind::Wah).unwrap();
    assert!((wah.binding("filter").unwrap().value() - 1500.0).abs() < 1e-3);
}

#[test]
fn test_midi_bytes_to_routing() {
    let mut control = default_board();
    let event = ControlEvent::from_midi(&[0x90, 1, 100]).unwrap();
    assert_eq!(
        control.route(event),
        Ok(Routed::Toggled { index: 1, active: true })
    );
    // Note-off never toggles
    assert_eq!(ControlEvent::from_midi(&[0x80, 1, 0]), None);
}
