use std::collections::HashMap;

use serde::Serialize;

use super::domain::{Enrollment, JobId, StageDefinition, StageId};

/// Current stage distribution of a job's enrollments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineStats {
    pub job_id: JobId,
    pub total: usize,
    pub stages: Vec<StageCount>,
    /// Conversion between consecutive catalog stages.
    pub conversions: Vec<StageConversion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageCount {
    pub stage_id: StageId,
    pub display_name: String,
    pub position: u32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageConversion {
    pub from: StageId,
    pub to: StageId,
    /// `count(to) / count(from)`; `None` when nobody sits at `from`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
}

impl PipelineStats {
    /// Aggregate enrollments over the catalog. Stages are reported in catalog order with
    /// zero counts included; `total` also counts enrollments at stages the catalog lacks.
    pub fn compute(job_id: &JobId, stages: &[StageDefinition], enrollments: &[Enrollment]) -> Self {
        let mut by_stage: HashMap<&StageId, usize> = HashMap::new();
        for enrollment in enrollments {
            *by_stage.entry(&enrollment.current_stage_id).or_default() += 1;
        }

        let mut ordered: Vec<&StageDefinition> = stages.iter().collect();
        ordered.sort_by_key(|stage| stage.position);

        let counts: Vec<StageCount> = ordered
            .iter()
            .map(|stage| StageCount {
                stage_id: stage.id.clone(),
                display_name: stage.display_name.clone(),
                position: stage.position,
                count: by_stage.get(&stage.id).copied().unwrap_or(0),
            })
            .collect();

        let conversions = counts
            .windows(2)
            .map(|pair| StageConversion {
                from: pair[0].stage_id.clone(),
                to: pair[1].stage_id.clone(),
                rate: conversion_rate(pair[0].count, pair[1].count),
            })
            .collect();

        Self {
            job_id: job_id.clone(),
            total: enrollments.len(),
            stages: counts,
            conversions,
        }
    }

    pub fn count_for(&self, stage_id: &StageId) -> usize {
        self.stages
            .iter()
            .find(|entry| &entry.stage_id == stage_id)
            .map(|entry| entry.count)
            .unwrap_or(0)
    }

    /// Conversion between any two stages, consecutive or not.
    pub fn rate_between(&self, from: &StageId, to: &StageId) -> Option<f64> {
        conversion_rate(self.count_for(from), self.count_for(to))
    }
}

fn conversion_rate(from: usize, to: usize) -> Option<f64> {
    if from == 0 {
        None
    } else {
        Some(to as f64 / from as f64)
    }
}
