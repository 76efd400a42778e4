use records::{Chunk, DocumentGroup};
use std::collections::HashMap;

/// Groups chunks into one `DocumentGroup` per `file_id`.
///
/// Groups come out in the order their `file_id` first appears, and chunks keep
/// their input order inside a group. Chunks without a `file_id` all land in
/// the `"N/A"` group. The first chunk of a group decides its `source`,
/// `timestamp` and `created_at`.
pub fn group_by_file(chunks: &[Chunk]) -> Vec<DocumentGroup> {
    let mut groups: Vec<DocumentGroup> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for chunk in chunks {
        let file_id = chunk.file_id();
        let slot = *index.entry(file_id).or_insert_with(|| {
            let meta = &chunk.metadata;
            groups.push(DocumentGroup {
                source: chunk.source().to_string(),
                file_id: file_id.to_string(),
                chunk_count: 0,
                total_chars: 0,
                created_at: meta.display_created_at().to_string(),
                chunks: Vec::new(),
                timestamp: Some(meta.display_timestamp().to_string()),
            });
            groups.len() - 1
        });

        let group = &mut groups[slot];
        group.chunk_count += 1;
        group.total_chars += chunk.char_count();
        group.chunks.push(chunk.clone());
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::chunk;
    use records::{ChunkMetadata, NOT_AVAILABLE};

    #[test]
    fn test_groups_follow_first_appearance() {
        let chunks = vec![
            chunk("1", Some("f2"), Some("b.pdf"), "aa"),
            chunk("2", Some("f1"), Some("a.pdf"), "bbb"),
            chunk("3", Some("f2"), Some("b.pdf"), "c"),
            chunk("4", None, None, "dddd"),
            chunk("5", None, Some("loose.txt"), "e"),
        ];

        let groups = group_by_file(&chunks);
        let ids: Vec<_> = groups.iter().map(|g| g.file_id.as_str()).collect();
        assert_eq!(ids, vec!["f2", "f1", NOT_AVAILABLE]);

        let f2 = &groups[0];
        assert_eq!(f2.chunk_count, 2);
        assert_eq!(f2.total_chars, 3);
        let order: Vec<_> = f2.chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(order, vec!["1", "3"]);

        // The first chunk decides the source of the fallback group
        assert_eq!(groups[2].source, NOT_AVAILABLE);
        assert_eq!(groups[2].chunk_count, 2);
    }

    #[test]
    fn test_counts_add_up() {
        let chunks: Vec<_> = (0..50)
            .map(|i| {
                let file = format!("f{}", i % 7);
                chunk(&i.to_string(), Some(file.as_str()), Some("s"), &"x".repeat(i))
            })
            .collect();

        let groups = group_by_file(&chunks);
        let total: usize = groups.iter().map(|g| g.chunk_count).sum();
        assert_eq!(total, chunks.len());

        for group in &groups {
            let chars: usize = group.chunks.iter().map(|c| c.char_count()).sum();
            assert_eq!(group.total_chars, chars);
            assert!(group.chunks.iter().all(|c| c.file_id() == group.file_id));
        }
    }

    #[test]
    fn test_timestamp_taken_from_first_chunk() {
        let first = records::Chunk::new(
            "1",
            "x",
            ChunkMetadata {
                file_id: Some("f".into()),
                date: Some("2024-05-01".into()),
                ..Default::default()
            },
        );
        let second = records::Chunk::new(
            "2",
            "y",
            ChunkMetadata {
                file_id: Some("f".into()),
                timestamp: Some("later".into()),
                ..Default::default()
            },
        );

        let groups = group_by_file(&[first, second]);
        assert_eq!(groups[0].timestamp.as_deref(), Some("2024-05-01"));
        assert_eq!(groups[0].created_at, "2024-05-01");
    }

    #[test]
    fn test_empty_input() {
        assert!(group_by_file(&[]).is_empty());
    }
}
