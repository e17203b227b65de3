//! Variable path parsing: `$.pipeline.<stage-index>.<field>...`, optionally
//! with `[<index>]` array-index brackets (§3, §4.5).

use crate::error::{AppError, AppResult};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    Index(usize),
}

/// Parses and validates that `path` is absolute and rooted at `pipeline`.
/// Returns the segments *after* `$.pipeline` (i.e. the position inside the
/// pipeline array).
pub fn parse(path: &str) -> AppResult<Vec<Segment>> {
    if !path.starts_with('$') {
        return Err(AppError::QueryValidation(format!(
            "variable path must be absolute (start with '$'): {path}"
        )));
    }
    let mut segments = Vec::new();
    for raw in path.split('.').skip(1) {
        if raw.is_empty() {
            return Err(AppError::QueryValidation(format!("empty path segment in {path}")));
        }
        let (name, brackets) = split_brackets(raw)?;
        if !name.is_empty() {
            match name.parse::<usize>() {
                Ok(idx) => segments.push(Segment::Index(idx)),
                Err(_) => segments.push(Segment::Field(name.to_string())),
            }
        }
        for idx in brackets {
            segments.push(Segment::Index(idx));
        }
    }

    match segments.first() {
        Some(Segment::Field(f)) if f == "pipeline" => Ok(segments[1..].to_vec()),
        _ => Err(AppError::QueryValidation(format!(
            "variable path must start with 'pipeline': {path}"
        ))),
    }
}

fn split_brackets(raw: &str) -> AppResult<(&str, Vec<usize>)> {
    let Some(bracket_start) = raw.find('[') else {
        return Ok((raw, Vec::new()));
    };
    let (name, rest) = raw.split_at(bracket_start);
    let mut indexes = Vec::new();
    let mut rest = rest;
    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(end) = stripped.find(']') else {
            return Err(AppError::QueryValidation(format!("unterminated index in {raw}")));
        };
        let idx: usize = stripped[..end]
            .parse()
            .map_err(|_| AppError::QueryValidation(format!("non-numeric index in {raw}")))?;
        indexes.push(idx);
        rest = &stripped[end + 1..];
    }
    Ok((name, indexes))
}

/// Walk `pipeline` along `segments`; `None` if the position does not exist.
pub fn resolve<'a>(pipeline: &'a [Value], segments: &[Segment]) -> Option<&'a Value> {
    let Some((Segment::Index(stage_idx), rest)) = segments.split_first() else {
        return None;
    };
    let mut current = pipeline.get(*stage_idx)?;
    for segment in rest {
        current = match segment {
            Segment::Field(name) => current.get(name)?,
            Segment::Index(idx) => current.get(idx)?,
        };
    }
    Some(current)
}

/// Like [`resolve`] but returns a mutable reference, creating intermediate
/// objects as needed — used by variable injection.
pub fn resolve_mut<'a>(pipeline: &'a mut [Value], segments: &[Segment]) -> Option<&'a mut Value> {
    let Some((Segment::Index(stage_idx), rest)) = segments.split_first() else {
        return None;
    };
    let mut current = pipeline.get_mut(*stage_idx)?;
    for segment in rest {
        current = match segment {
            Segment::Field(name) => current.get_mut(name)?,
            Segment::Index(idx) => current.get_mut(*idx)?,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_simple_path() {
        let segments = parse("$.pipeline.0.$match.age").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Index(0),
                Segment::Field("$match".to_string()),
                Segment::Field("age".to_string())
            ]
        );
    }

    #[test]
    fn rejects_relative_path() {
        assert!(parse("pipeline.0.age").is_err());
    }

    #[test]
    fn rejects_path_not_rooted_at_pipeline() {
        assert!(parse("$.stages.0.age").is_err());
    }

    #[test]
    fn resolves_existing_position() {
        let pipeline = vec![json!({"$match": {"age": 0}})];
        let segments = parse("$.pipeline.0.$match.age").unwrap();
        assert_eq!(resolve(&pipeline, &segments), Some(&json!(0)));
    }

    #[test]
    fn missing_position_resolves_to_none() {
        let pipeline = vec![json!({"$match": {"age": 0}})];
        let segments = parse("$.pipeline.5.foo").unwrap();
        assert_eq!(resolve(&pipeline, &segments), None);
    }

    #[test]
    fn parses_array_index_brackets() {
        let segments = parse("$.pipeline.0.$match.tags[0]").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Index(0),
                Segment::Field("$match".to_string()),
                Segment::Field("tags".to_string()),
                Segment::Index(0),
            ]
        );
    }
}
