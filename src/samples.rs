//! Sample Markdown documents for testing and demonstration.
//!
//! Each sample exercises different block types and classifier paths.

/// Whitepaper-style document: frontmatter, badges, grouped sections with
/// diagram fences, a table, lists, quotes, code, and math artifacts.
pub fn whitepaper_sample() -> &'static str {
    r##"---
title: Atlas Platform Whitepaper
authors: [Platform Team]
---

![build](https://img.shields.io/badge/build-passing-brightgreen) ![license](https://img.shields.io/badge/license-MIT-blue)

# Atlas Data Platform

Atlas is a **streaming-first** data platform that unifies ingestion,
storage, and query across *heterogeneous* sources.

## 1. Introduction

Modern teams collect events faster than they can model them. Atlas
decouples collection from modeling with a durable event log and
schema-on-read projections.

> Data outlives code. Design the log first and the services follow.

## 2. Architecture

The platform splits into three planes: ingestion, storage, and query.

```mermaid
graph TD
  Producers --> Gateway
  Gateway --> Log[(Event Log)]
  Log --> Projections
  Projections --> QueryAPI
```

### 2.1 Ingestion-Gateway

The gateway authenticates producers and assigns each event a monotonic
sequence number.

#### Backpressure

When the log falls behind, the gateway sheds load by rejecting
non-critical topics first.

```mermaid
sequenceDiagram
  participant P as Producer
  participant G as Gateway
  P->>G: publish(batch)
  G-->>P: ack(sequence)
```

### 2.2 Event-Log

Events persist in segment files. Retention is configurable per topic;
the default keeps $30$ days.

| Property | Default | Range |
|----------|---------|-------|
| segment_size | 64 MB | 16-256 MB |
| retention | 30 d | 1-365 d |
| replication | 3 | 1-5 |

## 3. Query Model

Queries compile to plans over projections. Supported operators:

- filter
- project
- aggregate
  - count
  - sum
- join

1. Parse the query text
2. Bind column references
3. Emit the physical plan

Example plan output:

```json
{
  "operator": "aggregate",
  "group_by": ["topic"],
  "metrics": ["count"]
}
```

## 4. Deployment

--8<-- "diagrams/deployment-topology.mmd"

Brokers scale horizontally; throughput reaches $2 \times 10^3$ batches
per second per broker.

---

See the [operations guide](https://atlas.example.com/ops) for rollout
checklists and the `atlasctl` reference.
"##
}

/// One of every block type, for coverage-style tests.
pub fn all_blocks_sample() -> &'static str {
    r##"# Block Gallery

Plain paragraph with **bold**, *italic*, `code`, and a [link](https://example.com).

## Second Level

### 9.1 Grouped-Entity

Member paragraph.

#### Member Detail

- one
- two
  - nested

1. first
2. second

| K | V |
|---|---|
| a | 1 |

> quoted wisdom
> continues here

```text
verbatim code
```

---

Last paragraph.
"##
}

/// Consecutive numbered subsections, for grouping tests.
pub fn entity_sections_sample() -> &'static str {
    r##"## 4. Storage Engines

### 4.1 Segment-Store

Append-only segments with sparse indexes.

### 4.2 Projection-Store

Materialized views refreshed on a schedule.

#### Compaction

Old generations merge during off-peak hours.

### Notes

This heading is not numbered, so it sits outside any group.
"##
}

/// Tables with alignment colons, jagged rows, and a one-column table.
pub fn table_edge_cases_sample() -> &'static str {
    r##"| Name | Role | Region |
|:-----|:----:|-------:|
| ada | admin |
| lin | analyst | eu-west | extra |

| Compact |
|---------|
| single |
"##
}

/// A loose list followed by marker-style switches.
pub fn loose_list_sample() -> &'static str {
    r##"Provision checklist:

- request quota

- confirm region

* a starred marker continues the same list
1. ordered markers start a new one
2. and it carries on
"##
}

/// Minimal document for unit testing.
pub fn minimal_sample() -> &'static str {
    r#"# Title

Body text.
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::parse_markdown;
    use crate::diagrams::DiagramCatalog;

    #[test]
    fn samples_classify_to_non_empty_documents() {
        let samples: Vec<(&str, &str)> = vec![
            ("whitepaper", whitepaper_sample()),
            ("all_blocks", all_blocks_sample()),
            ("entity_sections", entity_sections_sample()),
            ("table_edge_cases", table_edge_cases_sample()),
            ("loose_list", loose_list_sample()),
            ("minimal", minimal_sample()),
        ];

        let catalog = DiagramCatalog::empty();
        for (name, md) in samples {
            let doc = parse_markdown(md, &catalog);
            assert!(
                !doc.is_empty(),
                "Sample '{}' should classify to a non-empty document",
                name
            );
        }
    }
}
