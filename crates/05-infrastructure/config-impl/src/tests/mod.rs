//! 配置实现测试

mod binder_tests;
