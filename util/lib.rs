/*!
This crate provides text utilities shared by the other `upvote` crates.
*/

#![allow(clippy::tabs_in_doc_comments)]

pub mod word_tokenizer;
