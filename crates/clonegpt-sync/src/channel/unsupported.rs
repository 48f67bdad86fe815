use clonegpt_types::SyncError;

use super::{ChannelBackend, ChannelPort};

/// Backend for runtimes without a cross-context messaging primitive.
pub struct UnsupportedChannel;

impl ChannelBackend for UnsupportedChannel {
    fn open(&self, _name: &str) -> Result<Box<dyn ChannelPort>, SyncError> {
        Err(SyncError::Unsupported)
    }
}
