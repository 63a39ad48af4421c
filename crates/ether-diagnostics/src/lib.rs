//! User-facing errors for Ether.
//!
//! Every failure a command can end with is one of these, rendered by miette
//! with a code and, where there is something to suggest, a help line.

// These fields are used by thiserror/miette derive macros
#![allow(unused_assignments)]

pub use miette::{Diagnostic, Report, Result};
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum EtherError {
    #[error("Package.swift not found in {path}")]
    #[diagnostic(
        code(ether::manifest::not_found),
        help("Run ether inside a Swift package, or pass --project <dir>")
    )]
    ManifestNotFound { path: String },

    #[error("Could not read or write {path}: {message}")]
    #[diagnostic(code(ether::manifest::io))]
    ManifestIo { path: String, message: String },

    #[error("Malformed manifest: {message}")]
    #[diagnostic(
        code(ether::manifest::malformed),
        help("Ether only edits literal arrays inside `let package = Package(...)`")
    )]
    MalformedManifest { message: String },

    #[error("'{name}' is already a dependency")]
    #[diagnostic(
        code(ether::manifest::duplicate),
        help("Use `ether version set {name} <version>` to change its version")
    )]
    DuplicateDependency { name: String },

    #[error("Dependency '{name}' not found in Package.swift")]
    #[diagnostic(code(ether::manifest::dependency_not_found))]
    DependencyNotFound { name: String },

    #[error("No resolved package named '{name}'")]
    #[diagnostic(
        code(ether::manifest::unresolved),
        help("Run `swift package resolve` so Package.resolved lists it, then try again")
    )]
    UnresolvedName { name: String },

    #[error("Target '{name}' not found in Package.swift")]
    #[diagnostic(code(ether::manifest::target_not_found))]
    TargetNotFound { name: String },

    #[error("Failed to read the lockfile: {message}")]
    #[diagnostic(
        code(ether::lockfile::invalid),
        help("Delete Package.resolved and run `swift package resolve` to regenerate it")
    )]
    Lockfile { message: String },

    #[error("`{command}` failed: {message}")]
    #[diagnostic(code(ether::process::failed))]
    ExternalProcess { command: String, message: String },

    #[error("`{tool}` not found on PATH")]
    #[diagnostic(code(ether::process::not_found), help("{help}"))]
    ToolNotFound { tool: String, help: String },

    #[error("Network error: {message}")]
    #[diagnostic(
        code(ether::network::error),
        help("Check your internet connection and try again")
    )]
    NetworkError { message: String },

    #[error("No package found for '{query}'")]
    #[diagnostic(
        code(ether::network::package_not_found),
        help("Pass the repository with --url, or try `ether search {query}`")
    )]
    PackageNotFound { query: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(ether::config::invalid))]
    Config { message: String },

    #[error("{0}")]
    #[diagnostic(code(ether::generic))]
    Generic(String),
}

impl EtherError {
    pub fn manifest_not_found(path: impl Into<String>) -> Self {
        Self::ManifestNotFound { path: path.into() }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedManifest {
            message: message.into(),
        }
    }

    pub fn process(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalProcess {
            command: command.into(),
            message: message.into(),
        }
    }

    pub fn tool_not_found(tool: impl Into<String>, help: impl Into<String>) -> Self {
        Self::ToolNotFound {
            tool: tool.into(),
            help: help.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
        }
    }

    pub fn package_not_found(query: impl Into<String>) -> Self {
        Self::PackageNotFound {
            query: query.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Setup miette for pretty error output.
pub fn setup() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))
    .ok();
}
