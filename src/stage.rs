//! Text envelopes for handing intermediate results between pipeline stages

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Stage names used by the pipeline
pub mod names {
    pub const RECORDS: &str = "load_data";
    pub const SCALED: &str = "data_preprocessing";
    pub const SWEEP: &str = "build_save_model";
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    stage: &'a str,
    payload: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    stage: String,
    payload: T,
}

/// Encode `value` as self-describing text tagged with the producing stage
pub fn encode<T: Serialize>(stage: &str, value: &T) -> Result<String> {
    serde_json::to_string(&EnvelopeRef {
        stage,
        payload: value,
    })
    .map_err(|e| Error::Encoding(format!("encoding output of {stage}: {e}")))
}

/// Decode text produced by [`encode`], checking it came from `expected_stage`
pub fn decode<T: DeserializeOwned>(expected_stage: &str, text: &str) -> Result<T> {
    let envelope: Envelope<T> = serde_json::from_str(text)
        .map_err(|e| Error::Encoding(format!("decoding output of {expected_stage}: {e}")))?;
    if envelope.stage != expected_stage {
        return Err(Error::Encoding(format!(
            "expected output of {expected_stage}, got {}",
            envelope.stage
        )));
    }
    Ok(envelope.payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Record;
    use crate::scaler::scale;
    use crate::scaler::ScaledFeatureMatrix;

    #[test]
    fn test_scaled_matrix_survives_envelope() {
        let records = vec![
            Record::new(0.3, 41.7, 12.0, 0.815),
            Record::new(9.1, 38.2, 27.0, 0.377),
            Record::new(4.4, 45.0, 19.0, 0.602),
        ];
        let matrix = scale(&records).unwrap();

        let text = encode(names::SCALED, &matrix).unwrap();
        let decoded: ScaledFeatureMatrix = decode(names::SCALED, &text).unwrap();
        assert_eq!(decoded, matrix);
    }

    #[test]
    fn test_stage_mismatch_is_rejected() {
        let text = encode(names::RECORDS, &vec![Record::new(1.0, 2.0, 3.0, 4.0)]).unwrap();
        let err = decode::<Vec<Record>>(names::SCALED, &text).unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(decode::<Vec<Record>>(names::RECORDS, "%%%").is_err());
    }
}
