// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Variant effect prediction from the change in sequence log-likelihood that a
//! single-nucleotide substitution causes under a pretrained DNA sequence model.

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate derive_new;
#[macro_use]
extern crate getset;

pub mod calibration;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod coordinates;
pub mod errors;
pub mod genome;
pub mod oracle;
pub mod pipeline;
pub mod scoring;
pub mod selection;
pub mod sequence;
pub mod utils;
pub mod variant;

pub use crate::errors::{Error, ErrorKind, Result};
pub use crate::pipeline::{
    AnalysisPipeline, AnalysisPipelineBuilder, AnalysisRequest, AnalysisResponse,
};
