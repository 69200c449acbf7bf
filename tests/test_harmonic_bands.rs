/// Harmonic tremolo band modulation
///
/// The two band gains are driven by one LFO pair in anti-phase, so their
/// sum stays constant while each swings across its full range.
use pedalboard::pedals::harmonic_tremolo::build_bands;
use pedalboard::{AudioGraph, BlockProcessor, Frame};

const SAMPLE_RATE: f32 = 44100.0;

#[test]
fn test_band_gains_sum_to_one_at_any_speed() {
    for speed in [0.5, 4.4, 8.0] {
        let mut graph = AudioGraph::new(SAMPLE_RATE);
        let input = graph.add_source();
        let bands = build_bands(&mut graph, input, speed).unwrap();
        graph.set_output(bands.output).unwrap();
        let mut processor = BlockProcessor::new(graph).unwrap();

        let mut low_min = f32::MAX;
        let mut low_max = f32::MIN;
        for frame in 0..(2 * SAMPLE_RATE as usize) {
            processor.process_frame(Frame::mono(0.1));
            let high = processor.effective_param(&bands.high_gain);
            let low = processor.effective_param(&bands.low_gain);
            assert!(
                (high + low - 1.0).abs() < 1e-4,
                "speed {} frame {}: {} + {} != 1",
                speed,
                frame,
                high,
                low
            );
            low_min = low_min.min(low);
            low_max = low_max.max(low);
        }
        // At least one full cycle in two seconds: both extremes reached
        assert!(low_min < 0.01, "speed {}: low band never closed ({})", speed, low_min);
        assert!(low_max > 0.99, "speed {}: low band never opened ({})", speed, low_max);
    }
}

#[test]
fn test_speed_change_moves_both_lfos() {
    let mut graph = AudioGraph::new(SAMPLE_RATE);
    let input = graph.add_source();
    let bands = build_bands(&mut graph, input, 4.4).unwrap();
    graph.set_output(bands.output).unwrap();
    let mut processor = BlockProcessor::new(graph).unwrap();

    bands.lfo.frequency().set(2.0);
    assert_eq!(bands.lfo.first().frequency().get(), 2.0);
    assert_eq!(bands.lfo.second().frequency().get(), 2.0);

    // Still complementary after the change
    for _ in 0..4410 {
        processor.process_frame(Frame::mono(0.1));
        let sum = processor.effective_param(&bands.high_gain)
            + processor.effective_param(&bands.low_gain);
        assert!((sum - 1.0).abs() < 1e-4);
    }
}
