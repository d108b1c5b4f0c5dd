use rand::Rng;

pub fn cap_float(value: f32, min: f32, max: f32) -> f32 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

pub fn wrap_float(value: f32, min: f32, max: f32) -> f32 {
    let range = max - min;
    let mut value = value;

    while value < min {
        value += range;
    }
    while value >= max {
        value -= range;
    }

    value
}

pub fn lerp_float(a: f32, b: f32, t: f32) -> f32 {
    let t = cap_float(t, 0.0, 1.0);
    a + (b - a) * t
}

pub fn rand_in_range<R: Rng>(rng: &mut R, min: f32, max: f32) -> f32 {
    min + rng.random::<f32>() * (max - min)
}

pub fn rand_in_range_int<R: Rng>(rng: &mut R, min: i32, max: i32) -> i32 {
    min + (rng.random::<f32>() * (max - min + 1) as f32).floor() as i32
}

pub fn rand_index<R: Rng>(rng: &mut R, length: usize) -> usize {
    (rng.random::<f32>() * length as f32) as usize
}

// Squaring the fraction biases the jitter towards small displacements, which
// keeps jittered palettes coherent.
pub fn jitter<R: Rng>(rng: &mut R, value: f32, max_jitter: f32) -> f32 {
    let mut fraction = rng.random::<f32>().powi(2);
    if rng.random::<bool>() {
        fraction = -fraction;
    }

    value + fraction * max_jitter
}

pub fn jitter_with_cap<R: Rng>(rng: &mut R, value: f32, max_jitter: f32, min: f32, max: f32) -> f32 {
    cap_float(jitter(rng, value, max_jitter), min, max)
}

pub fn jitter_with_wrap<R: Rng>(rng: &mut R, value: f32, max_jitter: f32, min: f32, max: f32) -> f32 {
    wrap_float(jitter(rng, value, max_jitter), min, max)
}
