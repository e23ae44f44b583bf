use cvextract_core::error::CvError;
use cvextract_core::model::{to_pretty_json, CandidateProfile};

pub fn print(profile: &CandidateProfile) -> Result<(), CvError> {
    let json = to_pretty_json(profile)?;
    println!("{json}");
    Ok(())
}
