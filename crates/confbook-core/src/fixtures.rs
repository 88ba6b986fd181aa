//! Demo data

use crate::comment::{Comment, CommentBuilder};
use crate::conference::Conference;
use crate::error::Result;
use crate::store::{CommentStore, ConferenceStore};
use crate::workflow::{CommentTransition, CommentWorkflow, StateMachine};
use tracing::info;

/// What a fixture load wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureSummary {
    pub conferences: usize,
    pub comments: usize,
}

/// Load the demo conferences and comment
///
/// Unless `append` is set, existing data is cleared first. The demo comment
/// is published by walking it through the workflow.
pub fn load<S>(store: &S, append: bool) -> Result<FixtureSummary>
where
    S: CommentStore + ConferenceStore + ?Sized,
{
    if !append {
        store.clear()?;
    }

    let amsterdam = Conference::new("Amsterdam", "2022", true)?;
    let paris = Conference::new("Paris", "2023", false)?;
    store.save_conference(&amsterdam)?;
    store.save_conference(&paris)?;

    let comment = published_comment(&amsterdam)?;
    store.save(&comment)?;

    info!("Loaded fixtures: 2 conferences, 1 comment");
    Ok(FixtureSummary {
        conferences: 2,
        comments: 1,
    })
}

fn published_comment(conference: &Conference) -> Result<Comment> {
    let mut comment = CommentBuilder::new(conference.id)
        .author("Fabien")
        .email("fabien@example.com")
        .text("This was a great conference.")
        .build()?;
    CommentWorkflow::apply_transition(&mut comment, CommentTransition::AcceptAsHam)?;
    CommentWorkflow::apply_transition(&mut comment, CommentTransition::Publish)?;
    Ok(comment)
}
