//! # docscout — Documentation Search MCP Server
//!
//! Answers natural-language queries against a curated set of remote
//! documentation pages and serves full page content on demand via the
//! Model Context Protocol (MCP). Startup only fetches the llms.txt catalogs;
//! page content is fetched lazily and memoized.
//!
//! ## Architecture
//!
//! - **[`config`]** — Configuration loading and validation
//! - **[`fetcher`]** — HTTP retrieval and HTML-to-text cleaning
//! - **[`catalog`]** — llms.txt link parsing and catalog merging
//! - **[`search`]** — Title index, ranking and snippets
//! - **[`cache`]** — Single-flight page cache
//! - **[`policy`]** — Which URIs may be fetched
//! - **[`service`]** — Lifecycle and the search / fetch operations
//! - **[`mcp`]** — MCP server with 2 tool handlers (stdio transport via rmcp)

pub mod cache;
pub mod catalog;
pub mod config;
pub mod fetcher;
pub mod mcp;
pub mod policy;
pub mod search;
pub mod service;
