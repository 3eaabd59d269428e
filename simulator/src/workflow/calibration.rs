use anyhow::{bail, Context};
use std::io::{BufRead, Write};
use trajcore::processing::{ConversionRatio, UnitConverter};

/// Asks for the real-world size of the reference object until a positive
/// number is entered. Closing the input aborts.
pub fn prompt_real_world_length<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    object: &str,
) -> anyhow::Result<f64> {
    let mut line = String::new();
    loop {
        write!(output, "Enter the {} in real-world units (in m): ", object)?;
        output.flush()?;

        line.clear();
        let read = input
            .read_line(&mut line)
            .context("reading calibration input")?;
        if read == 0 {
            bail!("calibration input closed before a valid {} was entered", object);
        }

        match line.trim().parse::<f64>() {
            Ok(value) if !value.is_finite() => {
                writeln!(output, "Please enter a valid number.")?;
            }
            Ok(value) if value == 0.0 => {
                writeln!(output, "The {} cannot be 0!", object)?;
            }
            Ok(value) if value < 0.0 => {
                writeln!(output, "Please enter a positive value.")?;
            }
            Ok(value) => return Ok(value),
            Err(_) => {
                writeln!(output, "Please enter a valid number.")?;
            }
        }
    }
}

/// Prompts for the reference length and turns it into a conversion ratio
/// against the detected pixel size.
pub fn prompt_ratio<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    pixel_measurement: f64,
    object: &str,
) -> anyhow::Result<ConversionRatio> {
    if !(pixel_measurement.is_finite() && pixel_measurement > 0.0) {
        bail!(
            "error in detecting projectile (pixel size {}); relaunch and try again",
            pixel_measurement
        );
    }
    let real_world = prompt_real_world_length(input, output, object)?;
    UnitConverter::derive_ratio(pixel_measurement, real_world).context("deriving conversion ratio")
}
