//! Custom tracing layers for Huddle
//!
//! [`ParticipantContextLayer`] stamps every new span with the active
//! [`ParticipantContextGuard`] data, and [`jsonl_layer`] builds the JSONL
//! formatter used for both console and file output.

use tracing::{Subscriber, span};
use tracing_subscriber::{
    Layer, Registry,
    fmt::MakeWriter,
    layer::Context,
    registry::LookupSpan,
};

use crate::config::JsonlConfig;
use crate::context::{ParticipantContextData, ParticipantContextGuard};

/// Layer that attaches participant context to spans
///
/// Spans created while a [`ParticipantContextGuard`] is active carry a
/// [`ParticipantContextExtension`], so the context survives even when the
/// span is entered later from another scope.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParticipantContextLayer;

impl ParticipantContextLayer {
    pub fn new() -> Self {
        Self
    }
}

/// Extension data stored on spans
#[derive(Debug, Clone)]
pub struct ParticipantContextExtension {
    pub data: ParticipantContextData,
}

impl<S> Layer<S> for ParticipantContextLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(&self, _attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        if let Some(data) = ParticipantContextGuard::current() {
            span.extensions_mut()
                .insert(ParticipantContextExtension { data });
        }
    }
}

/// Boxed layer stacked on the global registry
pub type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// JSONL formatting layer writing to `writer`
pub fn jsonl_layer<W>(writer: W, config: &JsonlConfig) -> BoxedLayer
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(config.include_current_span)
        .with_span_list(config.include_spans)
        .flatten_event(config.flatten_events)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_thread_ids(config.include_thread_info)
        .with_thread_names(config.include_thread_info)
        .with_writer(writer)
        .boxed()
}

/// Human-readable console layer
pub fn pretty_layer(ansi: bool) -> BoxedLayer {
    tracing_subscriber::fmt::layer()
        .with_ansi(ansi)
        .with_target(true)
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use huddle_core::ParticipantId;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::SubscriberExt;

    /// Records the participant found on each span when it is entered
    #[derive(Clone, Default)]
    struct Inspector {
        seen: Arc<Mutex<Vec<Option<ParticipantId>>>>,
    }

    impl<S> Layer<S> for Inspector
    where
        S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    {
        fn on_enter(&self, id: &span::Id, ctx: Context<'_, S>) {
            if let Some(span) = ctx.span(id) {
                let participant = span
                    .extensions()
                    .get::<ParticipantContextExtension>()
                    .map(|ext| ext.data.participant);
                self.seen.lock().unwrap().push(participant);
            }
        }
    }

    #[test]
    fn test_span_carries_context() {
        let inspector = Inspector::default();
        let subscriber = Registry::default()
            .with(ParticipantContextLayer::new())
            .with(inspector.clone());

        tracing::subscriber::with_default(subscriber, || {
            let with_ctx = {
                let _guard = ParticipantContextGuard::new(ParticipantId(5));
                tracing::info_span!("panel_tick")
            };
            let without_ctx = tracing::info_span!("idle");

            // Entered after the guard dropped; the span still carries it
            with_ctx.in_scope(|| {});
            without_ctx.in_scope(|| {});
        });

        let seen = inspector.seen.lock().unwrap().clone();
        assert_eq!(seen, vec![Some(ParticipantId(5)), None]);
    }

    #[test]
    fn test_jsonl_layer_writes_json_lines() {
        let buffer = Arc::new(Mutex::new(Vec::<u8>::new()));
        let sink = buffer.clone();
        let make_writer = move || SharedBuffer(sink.clone());

        let subscriber = Registry::default().with(jsonl_layer(make_writer, &JsonlConfig::default()));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(participant = 3, slot = 0, "slot assigned");
        });

        let output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        let line: serde_json::Value = serde_json::from_str(output.lines().next().unwrap()).unwrap();
        assert_eq!(line["message"], "slot assigned");
        assert_eq!(line["participant"], 3);
        assert_eq!(line["level"], "INFO");
    }

    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
