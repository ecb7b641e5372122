use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use std::error::Error;

use stdecomp_stica::{decompose, DecompositionError, Method, OutputOptions, StIcaParams};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    // a synthetic recording with four active cells
    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    let movie = stdecomp_datasets::movie(300, 48, 48, 4, 0.05, &mut rng);

    let method = Method::StIca(StIcaParams::new(4).mu(0.3).random_state(42));
    let options = OutputOptions::new().traces(true);

    let result = match decompose(&method, &movie.frames, &options) {
        Ok(result) => result,
        Err(DecompositionError::NotConverged {
            iterations,
            partial,
        }) => {
            println!("stICA stopped after {} iterations", iterations);
            *partial
        }
        Err(err) => return Err(err.into()),
    };

    let masks = result.masks().expect("masks were requested");
    let traces = result.traces().expect("traces were requested");
    for (i, (mask, trace)) in masks.outer_iter().zip(traces.outer_iter()).enumerate() {
        let area = mask.iter().filter(|&&label| label != 0).count();
        let peak = trace.fold(f64::MIN, |acc, &v| acc.max(v));
        println!(
            "component {}: skewness {:.2}, {} pixels, peak intensity {:.3}",
            i,
            result.skewness()[i],
            area,
            peak
        );
    }

    let method = "NMF".parse().map(Method::<f64>::default_for)?;
    let result = decompose(&method, &movie.frames, &OutputOptions::new());
    match result {
        Ok(result) => println!("NMF converged after {:?} iterations", result.n_iter()),
        Err(err) => println!("NMF: {}", err),
    }

    Ok(())
}
