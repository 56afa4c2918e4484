//! Citation assembly.
//!
//! `ask` groups fragments per document; `search` groups per file and
//! attaches relevance. The two granularities differ on purpose.

use crate::types::{Citation, Fragment, Partition};

/// One citation per document, in order of first appearance.
///
/// Relevance is not attached on this path.
pub fn cite_by_document(index: &str, fragments: &[Fragment]) -> Vec<Citation> {
    let mut citations: Vec<Citation> = Vec::new();

    for fragment in fragments {
        let partition = Partition::from_fragment(fragment, None);

        match citations
            .iter_mut()
            .find(|c| c.document_id == fragment.document_id)
        {
            Some(citation) => citation.partitions.push(partition),
            None => {
                let mut citation = Citation::for_fragment(index, fragment);
                citation.partitions.push(partition);
                citations.push(citation);
            }
        }
    }

    citations
}

/// One citation per `(index, document, file)`, stopping at `limit` citations.
///
/// Fragments are consumed in the given order, which is relevance order for
/// similarity results. Fragments with blank partition text are logged and
/// skipped. A `None` relevance means the fragment came from a filter-only
/// listing.
pub fn cite_by_file(
    index: &str,
    fragments: &[(Fragment, Option<f32>)],
    limit: usize,
) -> Vec<Citation> {
    let mut citations: Vec<Citation> = Vec::new();

    if limit == 0 {
        return citations;
    }

    for (fragment, relevance) in fragments {
        let text = fragment.partition_text.trim();
        if text.is_empty() {
            tracing::error!("The document partition is empty, record: {}", fragment.id);
            continue;
        }

        if let Some(relevance) = relevance {
            tracing::trace!("Adding result with relevance {}", relevance);
        }

        let link = fragment.link(index);
        let mut partition = Partition::from_fragment(fragment, *relevance);
        partition.text = text.to_string();

        match citations.iter_mut().find(|c| c.link == link) {
            Some(citation) => citation.partitions.push(partition),
            None => {
                let mut citation = Citation::for_fragment(index, fragment);
                citation.partitions.push(partition);
                citations.push(citation);
            }
        }

        if citations.len() >= limit {
            break;
        }
    }

    citations
}
