pub mod catalog;
pub mod library;

use stacks_kernel::ModuleRegistry;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry) {
    registry.register_custom(library::create_module());
    registry.register_custom(catalog::create_module());
}
