// Copyright 2025 Cowboy AI, LLC.

//! Administrative context: labs, projects and experiments
//!
//! These types exist to own samples and to name them. A generated sample name
//! has the shape `<lab code><experiment id>.<project id>:<timestamp><suffix>`,
//! e.g. `ACL018.018:48213907`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::NamingConfig;
use crate::entity::{Contents, Lifecycle, Persist, SaveReceipt, Status, Tags};
use crate::errors::ProvenanceResult;
use crate::sample::{Sample, SampleRecord};
use crate::versionstamp::{VersionId, VersionstampGenerator};

/// Identifiers a generated sample name is built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingContext {
    /// Code of the owning lab
    pub lab_code: String,
    /// Owning experiment
    pub experiment_id: VersionId,
    /// Owning project
    pub project_id: VersionId,
}

impl NamingContext {
    /// Name stamped with the current time and a fresh versionstamp
    pub fn sample_name(&self, generator: &VersionstampGenerator, config: &NamingConfig) -> String {
        self.sample_name_at(Utc::now().timestamp_millis(), generator.next(), config)
    }

    /// Name for a given millisecond epoch and stamp
    pub fn sample_name_at(&self, epoch_ms: i64, stamp: VersionId, config: &NamingConfig) -> String {
        let millis = epoch_ms.unsigned_abs().to_string();
        let stamp = stamp.to_hex();
        let name = format!(
            "{}{}.{}:{}{}",
            head(&self.lab_code, config.lab_code_len),
            head(&self.experiment_id.to_hex(), config.id_prefix_len),
            head(&self.project_id.to_hex(), config.id_prefix_len),
            tail(&millis, config.timestamp_digits),
            tail(&stamp, config.suffix_len),
        );
        if config.uppercase {
            name.to_uppercase()
        } else {
            name
        }
    }
}

/// `name` when given and non-empty, otherwise a generated name
pub fn generate_sample_name(
    name: Option<&str>,
    context: &NamingContext,
    generator: &VersionstampGenerator,
    config: &NamingConfig,
) -> String {
    match name {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => context.sample_name(generator, config),
    }
}

fn head(text: &str, len: usize) -> String {
    text.chars().take(len).collect()
}

// digits and hex only
fn tail(text: &str, len: usize) -> &str {
    &text[text.len().saturating_sub(len)..]
}

/// A research group or facility
#[derive(Debug, Clone)]
pub struct Lab {
    id: VersionId,
    name: String,
    code: String,
    location: String,
    projects: Vec<Project>,
    lifecycle: Lifecycle,
    generator: Arc<VersionstampGenerator>,
}

impl Lab {
    /// New lab without projects
    pub fn new(
        generator: Arc<VersionstampGenerator>,
        name: impl Into<String>,
        code: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        let lab = Self {
            id: generator.next(),
            name: name.into(),
            code: code.into(),
            location: location.into(),
            projects: Vec::new(),
            lifecycle: Lifecycle::new(),
            generator,
        };
        info!(lab_id = %lab.id, lab_name = %lab.name, lab_code = %lab.code, "lab created");
        lab
    }

    /// Identifier
    pub fn id(&self) -> VersionId {
        self.id
    }

    /// Name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Short code used in sample names
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Location
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Projects in creation order
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Create a project belonging to this lab
    pub fn create_project(
        &mut self,
        name: impl Into<String>,
        description: Option<&str>,
        tags: Tags,
    ) -> &Project {
        let project = Project {
            id: self.generator.next(),
            name: name.into(),
            description: description.unwrap_or_default().to_string(),
            tags,
            lab_id: self.id,
            lifecycle: Lifecycle::new(),
        };
        info!(project_id = %project.id, project_name = %project.name, lab_id = %self.id, "project created");
        let index = self.projects.len();
        self.projects.push(project);
        &self.projects[index]
    }

    /// Project by name
    pub fn project(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|project| project.name == name)
    }

    /// Id of the first project with this name
    pub fn project_id(&self, name: &str) -> Option<VersionId> {
        self.project(name).map(Project::id)
    }
}

impl Persist for Lab {
    fn save(&mut self) -> SaveReceipt {
        SaveReceipt {
            id: self.id,
            name: self.name.clone(),
            updated_at: self.lifecycle.touch(),
        }
    }
}

/// A line of work inside a lab
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    id: VersionId,
    name: String,
    description: String,
    tags: Tags,
    lab_id: VersionId,
    lifecycle: Lifecycle,
}

impl Project {
    /// Identifier
    pub fn id(&self) -> VersionId {
        self.id
    }

    /// Name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Tags
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Owning lab
    pub fn lab_id(&self) -> VersionId {
        self.lab_id
    }

    /// Lifecycle timestamps
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }
}

/// A run of samples under one lab and project
#[derive(Debug, Clone)]
pub struct Experiment {
    id: VersionId,
    name: String,
    description: String,
    tags: Tags,
    status: Status,
    contents: Contents,
    lifecycle: Lifecycle,
    lab_id: VersionId,
    lab_code: String,
    project_id: VersionId,
    naming: NamingConfig,
    samples: Vec<Sample>,
    generator: Arc<VersionstampGenerator>,
}

impl Experiment {
    /// New experiment for `project` in `lab`
    pub fn new(
        generator: Arc<VersionstampGenerator>,
        name: impl Into<String>,
        lab: &Lab,
        project: &Project,
    ) -> Self {
        if project.lab_id() != lab.id() {
            warn!(lab_id = %lab.id(), project_lab_id = %project.lab_id(), "project belongs to another lab");
        }
        let experiment = Self {
            id: generator.next(),
            name: name.into(),
            description: String::new(),
            tags: Tags::new(),
            status: Status::default(),
            contents: Contents::new(),
            lifecycle: Lifecycle::new(),
            lab_id: lab.id(),
            lab_code: lab.code().to_string(),
            project_id: project.id(),
            naming: NamingConfig::default(),
            samples: Vec::new(),
            generator,
        };
        info!(experiment_id = %experiment.id, experiment_name = %experiment.name, "experiment created");
        experiment
    }

    /// Use a non-default naming shape for new samples
    pub fn with_naming(mut self, naming: NamingConfig) -> Self {
        self.naming = naming;
        self
    }

    /// Attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Attach tags
    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    /// Attach opaque contents
    pub fn with_contents(mut self, contents: Contents) -> Self {
        self.contents = contents;
        self
    }

    /// Identifier
    pub fn id(&self) -> VersionId {
        self.id
    }

    /// Name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Tags
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Contents
    pub fn contents(&self) -> &Contents {
        &self.contents
    }

    /// Status
    pub fn status(&self) -> Status {
        self.status
    }

    /// Move to `status`
    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    /// Owning lab
    pub fn lab_id(&self) -> VersionId {
        self.lab_id
    }

    /// Owning project
    pub fn project_id(&self) -> VersionId {
        self.project_id
    }

    /// Identifiers used to name this experiment's samples
    pub fn naming_context(&self) -> NamingContext {
        NamingContext {
            lab_code: self.lab_code.clone(),
            experiment_id: self.id,
            project_id: self.project_id,
        }
    }

    /// Create a sample with a generated name and keep it
    pub fn create_sample(&mut self, description: impl Into<String>, tags: Tags) -> &mut Sample {
        let sample = Sample::named_for(self.generator.clone(), &self.naming_context(), &self.naming)
            .with_description(description)
            .with_tags(tags);
        info!(experiment_id = %self.id, sample_name = %sample.name(), "sample created in experiment");
        let index = self.samples.len();
        self.samples.push(sample);
        &mut self.samples[index]
    }

    /// Samples in creation order
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Sample by id
    pub fn sample(&self, id: VersionId) -> Option<&Sample> {
        self.samples.iter().find(|sample| sample.id() == id)
    }

    /// Mutable sample by id
    pub fn sample_mut(&mut self, id: VersionId) -> Option<&mut Sample> {
        self.samples.iter_mut().find(|sample| sample.id() == id)
    }

    /// Record view, with sample records (and their events) when `include_samples` is set
    pub fn to_record(&self, include_samples: bool) -> ProvenanceResult<ExperimentRecord> {
        let samples = if include_samples {
            let records = self
                .samples
                .iter()
                .map(|sample| sample.to_record(true))
                .collect::<ProvenanceResult<Vec<_>>>()?;
            Some(records)
        } else {
            None
        };
        Ok(ExperimentRecord {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            tags: self.tags.iter().cloned().collect(),
            status: self.status,
            created_at: self.lifecycle.created_at,
            updated_at: self.lifecycle.updated_at,
            contents: self.contents.clone(),
            lab_id: self.lab_id,
            lab_code: self.lab_code.clone(),
            project_id: self.project_id,
            samples,
        })
    }

    /// Record view as JSON
    pub fn to_dict(&self, include_samples: bool) -> ProvenanceResult<serde_json::Value> {
        Ok(serde_json::to_value(self.to_record(include_samples)?)?)
    }

    /// Rebuild an experiment and its samples from a record
    ///
    /// Naming is not part of the record; new samples use the default shape
    /// until [`Experiment::with_naming`] says otherwise.
    pub fn from_record(
        generator: Arc<VersionstampGenerator>,
        record: &ExperimentRecord,
    ) -> ProvenanceResult<Self> {
        let samples = record
            .samples
            .iter()
            .flatten()
            .map(|sample| Sample::from_record(generator.clone(), sample))
            .collect::<ProvenanceResult<Vec<_>>>()?;
        debug!(experiment_id = %record.id, samples = samples.len(), "experiment restored");
        Ok(Self {
            id: record.id,
            name: record.name.clone(),
            description: record.description.clone(),
            tags: record.tags.iter().cloned().collect(),
            status: record.status,
            contents: record.contents.clone(),
            lifecycle: Lifecycle::restored(record.created_at, record.updated_at),
            lab_id: record.lab_id,
            lab_code: record.lab_code.clone(),
            project_id: record.project_id,
            naming: NamingConfig::default(),
            samples,
            generator,
        })
    }

    /// Rebuild an experiment from a JSON record
    pub fn from_dict(
        generator: Arc<VersionstampGenerator>,
        value: serde_json::Value,
    ) -> ProvenanceResult<Self> {
        let record: ExperimentRecord = serde_json::from_value(value)?;
        Self::from_record(generator, &record)
    }
}

impl Persist for Experiment {
    fn save(&mut self) -> SaveReceipt {
        let updated_at = self.lifecycle.touch();
        info!(experiment_id = %self.id, status = ?self.status, "experiment saved");
        SaveReceipt {
            id: self.id,
            name: self.name.clone(),
            updated_at,
        }
    }
}

/// Serialized form of an [`Experiment`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExperimentRecord {
    /// Identifier
    pub id: VersionId,
    /// Name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Status
    #[serde(default)]
    pub status: Status,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last save time
    pub updated_at: DateTime<Utc>,
    /// Opaque contents
    #[serde(default)]
    pub contents: Contents,
    /// Owning lab
    pub lab_id: VersionId,
    /// Code of the owning lab
    pub lab_code: String,
    /// Owning project
    pub project_id: VersionId,
    /// Sample records, when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples: Option<Vec<SampleRecord>>,
}
