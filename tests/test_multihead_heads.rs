/// Multi-head delay construction
///
/// Each head closes a feedback loop through its delay line. A head with no
/// delay would close the loop without one and must be refused.
use pedalboard::nodes::sum::SumNode;
use pedalboard::pedals::multihead_delay::{build_head, HeadSettings, CHORUS_DELAY};
use pedalboard::pedals::{BoostPedal, MultiheadDelayPedal};
use pedalboard::{
    AudioGraph, BlockProcessor, EffectChain, Frame, NoImpulse, Pedal, PedalError, PedalKind,
};

const SAMPLE_RATE: f32 = 44100.0;

#[test]
fn test_zero_delay_head_is_a_graph_cycle() {
    let mut graph = AudioGraph::new(SAMPLE_RATE);
    let send = graph.add_source();
    let ret = graph.add_node(SumNode::new());

    let result = build_head(&mut graph, send, ret, 1, &HeadSettings::new(0.0, 0.0, 0.5));
    match result {
        Err(PedalError::GraphCycle(cycle)) => {
            assert_eq!(cycle.to_name, "GainNode", "loop closes back into the head gate");
        }
        Err(other) => panic!("expected GraphCycle, got {}", other),
        Ok(_) => panic!("zero-delay head must be rejected"),
    }
}

#[test]
fn test_zero_delay_head_skips_only_its_unit() {
    let mut graph = AudioGraph::new(SAMPLE_RATE);
    let mut broken = MultiheadDelayPedal::default();
    broken.heads[1].delay_time = 0.0;
    let pedals: Vec<Box<dyn Pedal>> = vec![
        Box::new(BoostPedal::default()),
        Box::new(broken),
        Box::new(BoostPedal::default()),
    ];

    let assembly = EffectChain::assemble(&mut graph, &pedals, &NoImpulse, 16);
    assert_eq!(assembly.failures.len(), 1);
    assert_eq!(assembly.failures[0].index, 2);
    assert_eq!(assembly.failures[0].kind, PedalKind::MultiheadDelay);
    assert!(matches!(assembly.failures[0].error, PedalError::GraphCycle(_)));

    let chain = assembly.chain;
    assert_eq!(chain.len(), 2);
    assert_eq!(chain.unit(3).unwrap().input(), chain.unit(1).unwrap().output());

    // The surviving units still render
    assert!(!chain.unit(1).unwrap().is_active());
    let mut processor = BlockProcessor::new(graph).unwrap();
    let mut out = Frame::SILENCE;
    for _ in 0..64 {
        out = processor.process_frame(Frame::mono(0.25));
    }
    assert!((out.left - 0.25).abs() < 1e-4);
}

#[test]
fn test_head_echoes_after_delay_and_chorus_time() {
    let mut graph = AudioGraph::new(SAMPLE_RATE);
    let send = graph.add_source();
    let ret = graph.add_node(SumNode::new());
    let settings = HeadSettings::new(0.0, 0.1, 0.0);
    build_head(&mut graph, send, ret, 1, &settings).unwrap();
    graph.set_output(ret).unwrap();
    let mut processor = BlockProcessor::new(graph).unwrap();

    let burst = 200;
    // The chorus stage adds its own 60 ms on top of the head time
    let echo_at = ((settings.delay_time + CHORUS_DELAY) * SAMPLE_RATE) as usize;
    let mut output = Vec::new();
    for frame in 0..(echo_at + 2 * burst) {
        let x = if frame < burst { 0.5 } else { 0.0 };
        output.push(processor.process_frame(Frame::mono(x)).peak());
    }

    let margin = 60;
    let early = output[..echo_at - margin]
        .iter()
        .fold(0.0f32, |m, &s| m.max(s));
    let echo = output[echo_at..echo_at + burst]
        .iter()
        .fold(0.0f32, |m, &s| m.max(s));
    assert!(early < 1e-3, "head sounded before its delay: {}", early);
    assert!(echo > 0.05, "no echo after {} frames: {}", echo_at, echo);
}

#[test]
fn test_feedback_repeats_include_chorus_time() {
    let mut graph = AudioGraph::new(SAMPLE_RATE);
    let send = graph.add_source();
    let ret = graph.add_node(SumNode::new());
    let settings = HeadSettings::new(0.0, 0.1, 0.5);
    build_head(&mut graph, send, ret, 1, &settings).unwrap();
    graph.set_output(ret).unwrap();
    let mut processor = BlockProcessor::new(graph).unwrap();

    let period = ((settings.delay_time + CHORUS_DELAY) * SAMPLE_RATE) as usize;
    let burst = 100;
    let mut output = Vec::new();
    for frame in 0..(2 * period + 2 * burst) {
        let x = if frame < burst { 0.5 } else { 0.0 };
        output.push(processor.process_frame(Frame::mono(x)).peak());
    }

    let window = |start: usize| output[start..start + burst].iter().fold(0.0f32, |m, &s| m.max(s));
    let first = window(period);
    let second = window(2 * period);
    let between = window(period + 2 * burst);
    assert!(second > 0.01, "second repeat missing at {} frames", 2 * period);
    assert!(second < first, "repeats must decay: {} then {}", first, second);
    assert!(between < 1e-3, "sound between repeats: {}", between);
}

#[test]
fn test_head_bindings_are_prefixed() {
    let mut graph = AudioGraph::new(SAMPLE_RATE);
    let send = graph.add_source();
    let ret = graph.add_node(SumNode::new());
    let head = build_head(&mut graph, send, ret, 3, &HeadSettings::new(0.5, 0.25, 0.2)).unwrap();

    let names: Vec<&str> = head.bindings.iter().map(|(b, _)| b.name()).collect();
    assert_eq!(
        names,
        vec![
            "head3.speed",
            "head3.feedback",
            "head3.depth",
            "head3.rate",
            "head3.bass",
            "head3.treble",
            "head3.pan",
            "head3.mix",
            "head3.on",
        ]
    );
    let continuous: Vec<&str> = head
        .bindings
        .iter()
        .filter(|(_, c)| *c)
        .map(|(b, _)| b.name())
        .collect();
    assert_eq!(continuous, vec!["head3.rate"]);
}
