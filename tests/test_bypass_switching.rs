/// Bypass switching through whole pedals
///
/// - hard bypass: the effect path is silent while bypassed
/// - tailed bypass: echoes already in the delay, and the reverb's
///   convolution tail, keep ringing after the unit is switched off
use pedalboard::nodes::convolver::PARTITION;
use pedalboard::pedals::{BoostPedal, DelayPedal, ReverbPedal};
use pedalboard::{
    AudioGraph, BlockProcessor, BuildContext, Frame, NoImpulse, Pedal, Space, SyntheticImpulse,
};

const SAMPLE_RATE: f32 = 44100.0;

fn render(processor: &mut BlockProcessor, input: f32, frames: usize) -> Vec<f32> {
    (0..frames)
        .map(|_| processor.process_frame(Frame::mono(input)).left)
        .collect()
}

fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
}

#[test]
fn test_hard_bypass_passes_dry_signal() {
    let mut graph = AudioGraph::new(SAMPLE_RATE);
    let input = graph.add_source();
    let mut context = BuildContext {
        graph: &mut graph,
        index: 1,
        impulses: &NoImpulse,
        max_loop_frames: 16,
    };
    let unit = BoostPedal::default().build(&mut context, input).unwrap();
    graph.set_output(unit.output()).unwrap();
    let mut processor = BlockProcessor::new(graph).unwrap();

    // Boost ships bypassed
    assert!(!unit.is_active());
    let bypassed = render(&mut processor, 0.5, 512);
    assert!(
        (bypassed[511] - 0.5).abs() < 1e-4,
        "bypassed output should equal input, got {}",
        bypassed[511]
    );

    unit.toggle(None);
    let boosted = render(&mut processor, 0.5, 2048);
    assert!(
        (boosted[2047] - 0.75).abs() < 1e-3,
        "active boost should apply gain 1.5, got {}",
        boosted[2047]
    );

    unit.toggle(None);
    let back = render(&mut processor, 0.5, 2048);
    assert!((back[2047] - 0.5).abs() < 1e-3);
}

#[test]
fn test_bypass_switch_is_click_free() {
    let mut graph = AudioGraph::new(SAMPLE_RATE);
    let input = graph.add_source();
    let mut context = BuildContext {
        graph: &mut graph,
        index: 1,
        impulses: &NoImpulse,
        max_loop_frames: 16,
    };
    let unit = BoostPedal::default().build(&mut context, input).unwrap();
    graph.set_output(unit.output()).unwrap();
    let mut processor = BlockProcessor::new(graph).unwrap();

    render(&mut processor, 0.5, 256);
    unit.toggle(Some(true));
    let after = render(&mut processor, 0.5, 1024);

    // Smoothed: no single-sample jump of the full 0.25 difference
    let largest_step = after
        .windows(2)
        .map(|w| (w[1] - w[0]).abs())
        .fold(0.0f32, f32::max);
    assert!(largest_step < 0.05, "step of {} is a click", largest_step);
}

#[test]
fn test_tailed_delay_rings_out_after_bypass() {
    let mut graph = AudioGraph::new(SAMPLE_RATE);
    let input = graph.add_source();
    let mut context = BuildContext {
        graph: &mut graph,
        index: 1,
        impulses: &NoImpulse,
        max_loop_frames: 16,
    };
    let pedal = DelayPedal::default();
    let unit = pedal.build(&mut context, input).unwrap();
    graph.set_output(unit.output()).unwrap();
    let mut processor = BlockProcessor::new(graph).unwrap();
    assert!(unit.is_active());

    // Short burst into the delay, then switch the unit off
    let burst = 441;
    render(&mut processor, 0.5, burst);
    unit.toggle(Some(false));

    let echo_at = (pedal.speed * SAMPLE_RATE) as usize;
    let tail = render(&mut processor, 0.0, echo_at + 2 * burst);
    let before_echo = &tail[..echo_at - burst - 100];
    let echo = &tail[echo_at - burst - 50..];

    assert!(
        peak(before_echo) < 1e-3,
        "nothing should sound between burst and echo, got {}",
        peak(before_echo)
    );
    assert!(
        peak(echo) > 0.05,
        "first echo should survive the bypass, peak {}",
        peak(echo)
    );
}

#[test]
fn test_bypassed_delay_takes_no_new_input() {
    let mut graph = AudioGraph::new(SAMPLE_RATE);
    let input = graph.add_source();
    let mut context = BuildContext {
        graph: &mut graph,
        index: 1,
        impulses: &NoImpulse,
        max_loop_frames: 16,
    };
    let pedal = DelayPedal {
        active: false,
        ..DelayPedal::default()
    };
    let unit = pedal.build(&mut context, input).unwrap();
    graph.set_output(unit.output()).unwrap();
    let mut processor = BlockProcessor::new(graph).unwrap();

    let burst = 441;
    let dry = render(&mut processor, 0.5, burst);
    assert!((dry[burst - 1] - 0.5).abs() < 1e-3);

    let echo_at = (pedal.speed * SAMPLE_RATE) as usize;
    let tail = render(&mut processor, 0.0, echo_at + 2 * burst);
    assert!(
        peak(&tail[burst..]) < 1e-3,
        "bypassed delay must not echo, peak {}",
        peak(&tail[burst..])
    );
}

#[test]
fn test_tailed_reverb_rings_out_after_bypass() {
    let mut graph = AudioGraph::new(SAMPLE_RATE);
    let input = graph.add_source();
    let impulses = SyntheticImpulse::new(Space::Room, 7);
    let mut context = BuildContext {
        graph: &mut graph,
        index: 1,
        impulses: &impulses,
        max_loop_frames: 16,
    };
    let unit = ReverbPedal::default().build(&mut context, input).unwrap();
    graph.set_output(unit.output()).unwrap();
    let mut processor = BlockProcessor::new(graph).unwrap();
    assert!(unit.is_active());

    render(&mut processor, 0.5, 441);
    unit.toggle(Some(false));
    let tail = render(&mut processor, 0.0, 48 * PARTITION);

    // Several partitions past the switch the convolution is still sounding
    let early = peak(&tail[4 * PARTITION..12 * PARTITION]);
    let late = peak(&tail[36 * PARTITION..44 * PARTITION]);
    assert!(early > 0.01, "reverb tail cut by the bypass, peak {}", early);
    assert!(late > 1e-5, "tail ended too soon, peak {}", late);
    assert!(late < early, "tail must decay: {} then {}", early, late);
}
