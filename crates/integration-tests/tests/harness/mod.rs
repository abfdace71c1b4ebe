#![allow(dead_code)]

pub mod config;
pub mod mock_upstream;

use std::sync::Arc;

use switchyard_config::Config;
use switchyard_llm::{HttpTransport, MarkdownTraceSink, ModelRouter, Pipeline, RequestAdapter};

/// Wire a pipeline to the HTTP transport the same way the binary does
pub fn pipeline(config: &Config) -> Pipeline {
    let router = Arc::new(ModelRouter::new(&config.routing).expect("routing rules compile"));
    let transport = Arc::new(HttpTransport::from_config(&config.providers).expect("HTTP clients build"));

    let pipeline = Pipeline::new(router, RequestAdapter::new(&config.adapter), transport);
    if config.trace.enabled {
        pipeline.with_trace_sink(Arc::new(MarkdownTraceSink::new(config.trace.directory.clone())))
    } else {
        pipeline
    }
}
