//! TestRepo builder for store-indexing integration tests
//!
//! Creates a temporary workspace, writes store files into it and builds
//! resolvers and snapshots over it.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::Arc;

use tempfile::TempDir;

use vuex_engine::fs_utils::OsFileSystem;
use vuex_engine::parsing::DEFAULT_MAX_FILE_SIZE;
use vuex_engine::{AliasMap, IncrementalReindexer, IndexSnapshot, PathResolver};

/// Entry file of the standard store layout
pub const STORE_ENTRY: &str = "src/store/index.js";

/// Builder for temporary workspaces
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Create a new empty workspace
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Workspace root as created (not canonicalized)
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn path_str(&self) -> String {
        self.dir.path().to_string_lossy().to_string()
    }

    /// Canonical absolute path of a workspace file
    pub fn file(&self, relative_path: &str) -> PathBuf {
        let full_path = self.dir.path().join(relative_path);
        fs::canonicalize(&full_path).unwrap_or(full_path)
    }

    /// Add a source file with the given content
    pub fn add_file(&self, relative_path: &str, content: &str) -> &Self {
        let full_path = self.dir.path().join(relative_path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&full_path, content).expect("Failed to write file");
        self
    }

    /// Remove a file, returning its canonical path from before removal
    pub fn remove_file(&self, relative_path: &str) -> PathBuf {
        let canonical = self.file(relative_path);
        fs::remove_file(&canonical).expect("Failed to remove file");
        canonical
    }

    /// Resolver with the `@/*` -> `src/*` alias
    pub fn resolver(&self) -> Arc<PathResolver> {
        let aliases = AliasMap::from_pairs(self.path(), [("@/*", vec!["src/*".to_string()])]);
        self.resolver_with(aliases)
    }

    pub fn resolver_with(&self, aliases: AliasMap) -> Arc<PathResolver> {
        Arc::new(PathResolver::new(self.path(), aliases, Arc::new(OsFileSystem)))
    }

    /// Full pass from `entry`
    pub fn index(&self, entry: &str) -> IndexSnapshot {
        let resolver = self.resolver();
        IncrementalReindexer::new(&resolver, DEFAULT_MAX_FILE_SIZE).full(&self.path().join(entry))
    }

    /// Run the vuex-engine binary in this workspace
    pub fn run_cli(&self, args: &[&str]) -> std::io::Result<Output> {
        Command::new(env!("CARGO_BIN_EXE_vuex-engine"))
            .current_dir(self.path())
            .env("VUEX_ENGINE_CONFIG", self.path().join(".no-config.toml"))
            .args(args)
            .output()
    }

    /// Run CLI and expect success, return stdout
    pub fn run_cli_success(&self, args: &[&str]) -> String {
        let output = self.run_cli(args).expect("Failed to run CLI");
        assert!(
            output.status.success(),
            "CLI command {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    /// Run CLI and expect failure, return (stdout, stderr, exit code)
    pub fn run_cli_failure(&self, args: &[&str]) -> (String, String, Option<i32>) {
        let output = self.run_cli(args).expect("Failed to run CLI");
        assert!(
            !output.status.success(),
            "CLI command {:?} should have failed",
            args
        );
        (
            String::from_utf8_lossy(&output.stdout).to_string(),
            String::from_utf8_lossy(&output.stderr).to_string(),
            output.status.code(),
        )
    }

    // ========================================================================
    // PRE-BUILT STORE LAYOUTS
    // ========================================================================

    /// Root store with an imported namespaced `user` module (and its
    /// non-namespaced `profile` child), an aliased non-namespaced `cart`
    /// module and two modules registered under `cart` at runtime
    pub fn with_standard_store(&self) -> &Self {
        self.add_file(
            STORE_ENTRY,
            r#"import Vue from 'vue'
import Vuex from 'vuex'
import user from './modules/user'
import cart from '@/store/modules/cart'

Vue.use(Vuex)

const store = new Vuex.Store({
  state: {
    /** Application title */
    title: 'Shop',
  },
  getters: {
    appTitle: (state) => state.title,
  },
  mutations: {
    SET_NAME(state, name) {
      state.title = name
    },
  },
  modules: {
    user,
    cart,
  },
})

store.registerModule(['cart', 'promo'], {
  namespaced: true,
  state: () => ({ code: '' }),
  mutations: {
    APPLY(state, code) {
      state.code = code
    },
  },
})

store.registerModule(['cart', 'extra'], {
  mutations: {
    EXTRA() {},
  },
})

export default store
"#,
        )
        .add_file(
            "src/store/mutation-types.js",
            "export const SET_NAME = 'SET_NAME'\n",
        )
        .add_file(
            "src/store/modules/user.js",
            r#"import { SET_NAME } from '../mutation-types'
import profile from './profile'

export default {
  namespaced: true,
  state: () => ({
    name: '',
    age: 0,
  }),
  getters: {
    displayName: (state) => state.name,
  },
  mutations: {
    [SET_NAME](state, name) {
      state.name = name
    },
  },
  actions: {
    save({ commit }, name) {
      commit(SET_NAME, name)
      commit('SET_NAME', name, { root: true })
    },
  },
  modules: { profile },
}
"#,
        )
        .add_file(
            "src/store/modules/profile.js",
            r#"export default {
  state: { avatar: null },
  mutations: {
    SET_AVATAR(state, avatar) {
      state.avatar = avatar
    },
  },
}
"#,
        )
        .add_file(
            "src/store/modules/cart.js",
            r#"import shared from './shared-actions'

const state = { items: [] }

const mutations = {
  ADD_ITEM(state, item) {
    state.items.push(item)
  },
}

export default {
  state,
  mutations,
  actions: { ...shared },
}
"#,
        )
        .add_file(
            "src/store/modules/shared-actions.js",
            "export default {\n  checkout({ commit }) {},\n}\n",
        )
    }

    /// A component consuming the standard store
    pub fn with_consumer_component(&self) -> &Self {
        self.add_file(
            "src/components/UserCard.vue",
            r#"<template>
  <div>{{ name }}</div>
</template>

<script>
import { mapState, mapMutations as mm } from 'vuex'

export default {
  computed: {
    ...mapState('user', ['name']),
  },
  methods: {
    ...mm(['SET_NAME']),
    rename() {
      this.$store.commit('user/SET_NAME', 'x')
    },
  },
}
</script>
"#,
        )
    }
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}
