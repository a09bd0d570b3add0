use crate::types::Channel;

/// Resolves a user-supplied channel reference to a channel of the current server.
pub trait ChannelLookup {
    fn find_channel(&self, reference: &str) -> Option<Channel>;
}

/// A reference matches by exact name, raw id, or `<#id>` mention.
impl ChannelLookup for [Channel] {
    fn find_channel(&self, reference: &str) -> Option<Channel> {
        self.iter()
            .find(|c| c.name == reference || c.id.as_str() == reference || c.id.mention() == reference)
            .cloned()
    }
}

impl ChannelLookup for Vec<Channel> {
    fn find_channel(&self, reference: &str) -> Option<Channel> {
        self.as_slice().find_channel(reference)
    }
}
