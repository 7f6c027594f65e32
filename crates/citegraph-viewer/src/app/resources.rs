use bevy::prelude::Resource;
use citegraph_resolver::ResolverHandle;

/// Present only when citation lookups are enabled.
#[derive(Resource)]
pub struct ResolverLink(pub ResolverHandle);
