use ab_glyph::FontVec;
use clap::{Arg, App};

use std::error::Error;
use std::fs;

use plate_extract::{utils, PlateExtractor};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let matches = App::new("plate-extract")
                    .version("0.1.0")
                    .about("Locates a license plate in a photograph and reads its text")
                    .arg(Arg::with_name("INPUT")
                        .help("image file with license plate")
                        .required(true)
                        .index(1))
                    .arg(Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .takes_value(true)
                        .help("write an annotated copy of the input image here"))
                    .arg(Arg::with_name("font")
                        .long("font")
                        .takes_value(true)
                        .help("ttf font used to draw the recognized text on the annotated image"))
                    .get_matches();
    let file_name = matches.value_of("INPUT").ok_or("image is required")?;

    let img = image::open(file_name)?;

    let extractor = PlateExtractor::new();
    let res = extractor.extract(&img)?;
    println!("{}", res.text.trim_end());

    if let Some(output) = matches.value_of("output") {
        let font = match matches.value_of("font") {
            Some(path) => Some(FontVec::try_from_vec(fs::read(path)?)?),
            None => None,
        };
        let annotated = utils::annotate(&img, &res.polygon, res.text.trim_end(), font.as_ref());
        annotated.save(output)?;
    }

    Ok(())
}
