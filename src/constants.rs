// src/constants.rs

// Step response frame geometry.
pub const FRAME_LENGTH_S: f64 = 1.0; // Length of each deconvolution frame in seconds
pub const RESPONSE_LENGTH_S: f64 = 0.5; // Length of the step response to keep from each frame
pub const SUPERPOSITION_FACTOR: usize = 16; // Number of overlapping frames within a frame length

// Wiener deconvolution.
pub const CUTOFF_FREQ_HZ: f64 = 25.0; // Input energy is assumed to live below this frequency
pub const FFT_BLOCK_LEN: usize = 1024; // Frames are zero-padded to a multiple of this length
pub const REGULARIZATION_GAIN: f64 = 10.0; // Scale of the signal-to-noise gain below cutoff
pub const REGULARIZATION_EPSILON: f64 = 1e-9;

// Input classification.
pub const MIN_INPUT_THRESHOLD: f64 = 20.0; // Frames below this are too small to measure
pub const HIGH_INPUT_THRESHOLD: f64 = 500.0; // Threshold for low/high input masking
pub const MIN_HIGH_FRAMES: usize = 10; // Fewer high-input frames than this are ignored

// Betaflight P-term scaling; input = gyro + p_err / (scale * P).
pub const P_GAIN_SCALE: f64 = 0.032029;

// Mode extraction histogram.
pub const RESPONSE_RANGE: [f64; 2] = [-1.5, 3.5];
pub const RESPONSE_BINS: usize = 1000;
pub const MODE_SMOOTHING_SIGMA: f64 = 7.0;
pub const ERROR_WIDTH_THRESHOLD: f64 = 0.5;

// Noise analysis.
pub const NOISE_FRAME_LENGTH_S: f64 = 0.3;
pub const NOISE_SUPERPOSITION_FACTOR: usize = 16;
pub const NOISE_TAIL_S: f64 = 2.0; // Landing and spin-down are trimmed from the end
pub const NOISE_SMOOTHING_SIGMA: f64 = 3.0;
pub const NOISE_FREQ_THRESHOLD_HZ: f64 = 100.0;
pub const NOISE_FREQ_DECIMATION: usize = 4;

// Throttle axis of every throttle-conditioned histogram (0..100 %).
pub const THROTTLE_BINS: usize = 101;
pub const THROTTLE_RANGE: [f64; 2] = [0.0, 100.0];

// Occupancy normalization guard.
pub const HISTOGRAM_EPSILON: f64 = 1e-9;

// Raw RC throttle command at zero throttle.
pub const RC_THROTTLE_MIN: f64 = 1000.0;

// Input-to-gyro delay search.
pub const MIN_SAMPLES_FOR_DELAY: usize = 100;
pub const MAX_DELAY_SAMPLES: usize = 200;
pub const MAX_DELAY_FRACTION: usize = 10; // Search at most n / MAX_DELAY_FRACTION lags
pub const MIN_DELAY_CORRELATION: f64 = 0.3;

// src/constants.rs
