//! Tiled driver against the untiled reference convolution.

use depthwise::depthwise::reference::depthwise_conv;
use depthwise::depthwise::{
    DepthwiseConvolution, DepthwiseKernel, PaddingType, Tile2x2Kernel3x3Stride1,
    Tile3x3Kernel3x3Stride1, Tile3x3Kernel3x3Stride2, Tile4x4Kernel3x3Stride1,
};
use depthwise::DepthwiseError;
use ndarray::{Array, ArrayView3, ArrayView4};
use rand::{rngs::StdRng, Rng, SeedableRng};

struct Problem {
    input: Vec<f32>,
    weights: Vec<f32>,
}

fn random_problem<K: DepthwiseKernel>(rng: &mut StdRng, conv: &DepthwiseConvolution<K>) -> Problem {
    Problem {
        input: (0..conv.input_len()).map(|_| rng.random_range(-1.0f32..1.0)).collect(),
        weights: (0..conv.weights_len()).map(|_| rng.random_range(-1.0f32..1.0)).collect(),
    }
}

fn reference<K: DepthwiseKernel>(
    conv: &DepthwiseConvolution<K>,
    problem: &Problem,
    shape: (usize, usize, usize, usize),
) -> Vec<f32> {
    let input = ArrayView4::from_shape(shape, &problem.input).unwrap();
    let weights =
        ArrayView3::from_shape((K::KERNEL_ROWS, K::KERNEL_COLS, shape.3), &problem.weights).unwrap();

    let output = depthwise_conv(
        input,
        weights,
        (K::STRIDE_ROWS, K::STRIDE_COLS),
        conv.padding(),
    )
    .unwrap();

    let (b, r, c, ch) = conv.output_shape();
    assert_eq!(output.dim(), (b, r, c, ch));
    output.iter().copied().collect()
}

fn assert_bits_eq(expected: &[f32], actual: &[f32], context: &str) {
    assert_eq!(expected.len(), actual.len(), "{}", context);
    for (idx, (e, a)) in expected.iter().zip(actual.iter()).enumerate() {
        assert_eq!(e.to_bits(), a.to_bits(), "{}: element {} ({} vs {})", context, idx, e, a);
    }
}

fn check_against_reference<K: DepthwiseKernel>(seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let shapes = [
        (1, 1, 1, 1),
        (1, 3, 3, 4),
        (2, 5, 7, 3),
        (1, 8, 8, 8),
        (1, 9, 6, 13),
        (3, 11, 4, 5),
        (1, 16, 15, 17),
    ];

    for shape in shapes {
        for padding_type in [PaddingType::Same, PaddingType::Valid] {
            let (batches, rows, cols, channels) = shape;
            let Ok(conv) =
                DepthwiseConvolution::<K>::new(batches, rows, cols, channels, padding_type)
            else {
                continue;
            };

            let problem = random_problem(&mut rng, &conv);
            let expected = reference(&conv, &problem, shape);

            let mut output = vec![f32::NAN; conv.output_len()];
            conv.run(&problem.input, &problem.weights, &mut output).unwrap();

            assert_bits_eq(&expected, &output, &format!("{:?} {:?}", shape, padding_type));
        }
    }
}

#[test]
fn test_run_matches_reference_2x2_stride1() {
    check_against_reference::<Tile2x2Kernel3x3Stride1>(100);
}

#[test]
fn test_run_matches_reference_3x3_stride1() {
    check_against_reference::<Tile3x3Kernel3x3Stride1>(101);
}

#[test]
fn test_run_matches_reference_3x3_stride2() {
    check_against_reference::<Tile3x3Kernel3x3Stride2>(102);
}

#[test]
fn test_run_matches_reference_4x4_stride1() {
    check_against_reference::<Tile4x4Kernel3x3Stride1>(103);
}

#[test]
fn test_explicit_padding_matches_reference() {
    let mut rng = StdRng::seed_from_u64(104);
    let shape = (1, 10, 9, 6);

    for (top, left, bottom, right) in [(2, 0, 0, 2), (0, 2, 2, 0), (1, 2, 2, 1), (2, 2, 2, 2)] {
        let conv = DepthwiseConvolution::<Tile3x3Kernel3x3Stride1>::with_padding(
            shape.0, shape.1, shape.2, shape.3, top, left, bottom, right,
        )
        .unwrap();

        let problem = random_problem(&mut rng, &conv);
        let expected = reference(&conv, &problem, shape);

        let mut output = vec![f32::NAN; conv.output_len()];
        conv.run(&problem.input, &problem.weights, &mut output).unwrap();

        assert_bits_eq(&expected, &output, &format!("{:?}", conv.padding()));
    }
}

#[test]
fn test_par_run_matches_run() {
    let mut rng = StdRng::seed_from_u64(105);
    let conv =
        DepthwiseConvolution::<Tile3x3Kernel3x3Stride2>::new(3, 23, 19, 21, PaddingType::Same)
            .unwrap();
    let problem = random_problem(&mut rng, &conv);

    let mut serial = vec![0.0f32; conv.output_len()];
    let mut parallel = vec![0.0f32; conv.output_len()];
    conv.run(&problem.input, &problem.weights, &mut serial).unwrap();
    conv.par_run(&problem.input, &problem.weights, &mut parallel).unwrap();

    assert_bits_eq(&serial, &parallel, "par_run");
}

#[test]
fn test_windows_cover_the_output() {
    let mut rng = StdRng::seed_from_u64(106);
    let conv =
        DepthwiseConvolution::<Tile2x2Kernel3x3Stride1>::new(2, 9, 7, 6, PaddingType::Same)
            .unwrap();
    let problem = random_problem(&mut rng, &conv);

    let mut whole = vec![0.0f32; conv.output_len()];
    conv.run(&problem.input, &problem.weights, &mut whole).unwrap();

    let window = conv.window();
    let mut pieces = vec![f32::NAN; conv.output_len()];
    for (start, stop) in [(0, 3), (3, 4), (4, window)] {
        conv.run_window(start, stop, &problem.input, &problem.weights, &mut pieces)
            .unwrap();
    }

    assert_bits_eq(&whole, &pieces, "windows");
}

#[test]
fn test_window_writes_only_its_rows() {
    let conv =
        DepthwiseConvolution::<Tile2x2Kernel3x3Stride1>::new(1, 8, 8, 4, PaddingType::Valid)
            .unwrap();
    let input = vec![1.0f32; conv.input_len()];
    let weights = vec![1.0f32; conv.weights_len()];
    let mut output = vec![-1.0f32; conv.output_len()];

    // 6x6 output in 3 tile rows; unit 1 is output rows 2 and 3
    conv.run_window(1, 2, &input, &weights, &mut output).unwrap();

    let row_len = 6 * 4;
    assert!(output[..2 * row_len].iter().all(|&v| v == -1.0));
    assert!(output[2 * row_len..4 * row_len].iter().all(|&v| v == 9.0));
    assert!(output[4 * row_len..].iter().all(|&v| v == -1.0));
}

#[test]
fn test_larger_buffers_are_accepted() {
    let conv =
        DepthwiseConvolution::<Tile4x4Kernel3x3Stride1>::new(1, 6, 6, 2, PaddingType::Same)
            .unwrap();
    let input = vec![0.5f32; conv.input_len() + 7];
    let weights = vec![2.0f32; conv.weights_len() + 1];
    let mut output = vec![-3.0f32; conv.output_len() + 5];

    conv.par_run(&input, &weights, &mut output).unwrap();

    assert!(output[conv.output_len()..].iter().all(|&v| v == -3.0));
    // centre cells see the full 3x3 window
    let centre = (2 * 6 + 2) * 2;
    assert_eq!(output[centre], 9.0);
}

#[test]
fn test_errors() {
    let conv =
        DepthwiseConvolution::<Tile3x3Kernel3x3Stride1>::new(1, 5, 5, 3, PaddingType::Same)
            .unwrap();
    let input = vec![0.0f32; conv.input_len()];
    let weights = vec![0.0f32; conv.weights_len()];
    let mut output = vec![0.0f32; conv.output_len() - 1];

    let err = conv.run(&input, &weights, &mut output).unwrap_err();
    assert_eq!(
        err,
        DepthwiseError::BufferSizeError {
            buffer: "output",
            expected: conv.output_len(),
            actual: conv.output_len() - 1,
        }
    );

    let mut output = vec![0.0f32; conv.output_len()];
    let err = conv
        .run_window(2, 1, &input, &weights, &mut output)
        .unwrap_err();
    assert!(matches!(err, DepthwiseError::WindowError { start: 2, stop: 1, .. }));
    assert!(err.to_string().contains("[2, 1)"));

    let err = DepthwiseConvolution::<Tile3x3Kernel3x3Stride1>::new(0, 5, 5, 3, PaddingType::Same)
        .unwrap_err();
    assert!(matches!(err, DepthwiseError::ShapeError { .. }));
}

#[test]
fn test_reference_rejects_oversized_kernel() {
    let input = Array::<f32, _>::zeros((1, 2, 2, 1));
    let weights = Array::<f32, _>::zeros((3, 3, 1));
    assert!(depthwise_conv(input.view(), weights.view(), (1, 1), (0, 0, 0, 0)).is_err());
}
