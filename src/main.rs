#[macro_use]
extern crate log;

use std::process::ExitCode;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use config::OPTIONS;
use errors::Result;
use heightmap::Heightmap;
use raster::pattern::{self, Pattern};
use raster::Image;

mod elapsedlogger;

mod color;
mod config;
mod errors;
mod heightmap;
mod metrics;
mod palette;
mod perlin;
mod raster;
mod render;
mod util;

fn main() -> ExitCode {
    elapsedlogger::init_logging();
    config::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let opt = &*OPTIONS;

    let heightmap = Heightmap::read(&opt.input)?;
    debug!(
        "{}x{} {} heightmap",
        heightmap.width(),
        heightmap.height(),
        if heightmap.rainbow() { "rainbow" } else { "grayscale" }
    );

    let settings = config::resolve(opt, heightmap.width())?;
    let stereo = settings.stereo;

    debug!(
        "eye separation {:.2}px, separation {:.2}..{:.2}px, edge echo offset {} rows",
        stereo.eye_separation,
        stereo.separation_min,
        stereo.separation_max,
        stereo.edge_echo_offset
    );

    let mut rng = match opt.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };

    let mut texture = match &opt.texture {
        Some(path) => {
            let mut texture = Image::read(path)?;

            if !opt.preserve_height {
                // The texture will be squeezed horizontally to between the
                // two separations in the output; scale it vertically so the
                // aspect ratio survives at the average separation.
                let target_width = 0.5 * (stereo.separation_min + stereo.separation_max);
                let height = (target_width / texture.width() as f32 * texture.height() as f32)
                    .round() as usize;
                texture.scale(texture.width(), height.max(1));
            }

            texture
        }
        None => {
            let width = (0.5 + stereo.separation_min + stereo.separation_max) as usize;
            let base = opt.color.unwrap_or_else(|| palette::random_base_color(&mut rng));

            pattern::synthesize(
                width,
                heightmap.height(),
                settings.density,
                opt.pattern.unwrap_or(Pattern::Random),
                base,
                &mut rng,
            )
        }
    };

    if opt.noise {
        texture.add_noise(&mut rng);
    }

    let output = render::create_stereogram(&heightmap, &texture, &stereo)?;
    output.write(&opt.output)?;

    Ok(())
}
